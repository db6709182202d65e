/// A single event decoded from the response stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// A fragment of the response text.
    Delta(String),

    /// A `data:` record whose payload could not be decoded.
    ///
    /// This is not fatal, decoding continues with the next record.
    Malformed {
        /// The offending line, lossily converted to UTF-8.
        line: String,

        /// Why the payload was rejected.
        reason: String,
    },

    /// The stream is complete.
    ///
    /// Produced for the `[DONE]` sentinel, or when the input ends without
    /// one. No events follow it.
    Done,
}

impl StreamEvent {
    #[must_use]
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }
}
