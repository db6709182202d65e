use std::fmt;

/// Accumulates streamed text fragments into a single response.
///
/// After each appended fragment the callback receives the *full* text
/// received so far, not just the fragment. Renderers such as Markdown
/// formatters cannot be applied incrementally, so they redraw from the
/// complete text every time.
pub struct ChunkAggregator<F> {
    text: String,
    on_update: F,
}

impl<F> ChunkAggregator<F>
where
    F: FnMut(&str),
{
    pub fn new(on_update: F) -> Self {
        Self {
            text: String::new(),
            on_update,
        }
    }

    /// Append a fragment and notify the callback.
    ///
    /// Empty fragments are ignored.
    pub fn append(&mut self, delta: &str) {
        if delta.is_empty() {
            return;
        }

        self.text.push_str(delta);
        (self.on_update)(&self.text);
    }

    /// The text aggregated so far.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Take the aggregated text, leaving the aggregator empty for reuse.
    pub fn finalize(&mut self) -> String {
        std::mem::take(&mut self.text)
    }
}

impl<F> fmt::Debug for ChunkAggregator<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChunkAggregator")
            .field("len", &self.text.len())
            .finish_non_exhaustive()
    }
}
