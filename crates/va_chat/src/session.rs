/// Per-session conversation settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// The model new turns are sent to.
    pub model: String,

    /// Number of prior turns included as context.
    pub attention: usize,

    /// Whether the current model acknowledged the agreement prompt.
    ///
    /// Only meaningful for gated models, and reset on every model switch.
    pub agreed: bool,
}

impl Session {
    #[must_use]
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            attention: 0,
            agreed: false,
        }
    }

    #[must_use]
    pub fn with_attention(mut self, attention: usize) -> Self {
        self.attention = attention;
        self
    }
}
