use va_conversation::Turn;

/// Out-of-band events reported to the front end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    /// The agreement prompt is being sent for a gated model.
    PrimingSent,

    /// The agreement prompt completed, the user prompt follows.
    PrimingAccepted,

    /// The request was cancelled, the partial response is kept.
    Aborted,
}

/// The front-end seam of a [`Chat`](crate::Chat).
///
/// A renderer is borrowed for the duration of a single submission.
pub trait Render {
    /// A new turn started. Priming turns are reported too, check
    /// [`Turn::is_priming`] to hide them.
    fn begin(&mut self, _turn: &Turn) {}

    /// The response grew. `text` is the full response received so far.
    fn update(&mut self, text: &str);

    fn notice(&mut self, _notice: Notice) {}

    /// The turn was sealed.
    fn finish(&mut self, _turn: &Turn) {}
}
