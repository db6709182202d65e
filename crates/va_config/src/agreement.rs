//! Agreement gate configuration.

use schematic::Config;

/// Models that must receive an acknowledgement message before they accept
/// prompts.
#[derive(Debug, Clone, PartialEq, Config)]
#[config(rename_all = "snake_case")]
pub struct AgreementConfig {
    /// Models requiring the acknowledgement.
    #[setting(default = vec![String::from("@cf/meta/llama-3.2-11b-vision-instruct")])]
    pub gated_models: Vec<String>,

    /// The acknowledgement prompt sent before the first user prompt.
    #[setting(default = "agree")]
    pub prompt: String,

    /// Time to wait after the acknowledgement completed, in milliseconds.
    #[setting(default = 2000)]
    pub settle_delay_ms: u64,
}
