use std::time::Duration;

use va_config::AgreementConfig;

/// Some models refuse to answer until they received an acknowledgement of
/// their license terms. The gate decides when such a priming turn is needed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgreementGate {
    gated_models: Vec<String>,
    prompt: String,
    settle_delay: Duration,
}

impl AgreementGate {
    #[must_use]
    pub fn new<I, S>(gated_models: I, prompt: impl Into<String>, settle_delay: Duration) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            gated_models: gated_models.into_iter().map(Into::into).collect(),
            prompt: prompt.into(),
            settle_delay,
        }
    }

    /// Whether `model` requires the acknowledgement.
    #[must_use]
    pub fn requires_gate(&self, model: &str) -> bool {
        self.gated_models.iter().any(|m| m == model)
    }

    /// Whether a priming turn must be sent before the next prompt.
    #[must_use]
    pub fn needs_priming(&self, model: &str, agreed: bool) -> bool {
        !agreed && self.requires_gate(model)
    }

    /// The agreement state after switching to `model`.
    #[must_use]
    pub fn agreed_after_switch(&self, model: &str) -> bool {
        !self.requires_gate(model)
    }

    /// The acknowledgement prompt.
    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// How long to wait after the acknowledgement completed.
    #[must_use]
    pub fn settle_delay(&self) -> Duration {
        self.settle_delay
    }
}

impl From<&AgreementConfig> for AgreementGate {
    fn from(config: &AgreementConfig) -> Self {
        Self::new(
            config.gated_models.iter().cloned(),
            config.prompt.clone(),
            Duration::from_millis(config.settle_delay_ms),
        )
    }
}
