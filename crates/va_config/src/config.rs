use schematic::Config;

use crate::{
    AgreementConfig, ProxyConfig, SpeechConfig,
    agreement::PartialAgreementConfig,
    error::{Error, Result},
    proxy::PartialProxyConfig,
    speech::PartialSpeechConfig,
};

/// Keys accepted by [`AppConfig::set`].
const KEYS: &[&str] = &[
    "model",
    "attention",
    "endpoint",
    "api_key",
    "models",
    "agreement.gated_models",
    "agreement.prompt",
    "agreement.settle_delay_ms",
    "proxy.account_id",
    "proxy.gateway_id",
    "proxy.api_key",
    "proxy.upstream",
    "proxy.listen",
    "speech.program",
    "speech.args",
    "speech.listen_program",
    "speech.listen_args",
];

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Config)]
#[config(rename_all = "snake_case")]
pub struct AppConfig {
    /// The model used for new turns.
    #[setting(default = "@cf/mistral/mistral-7b-instruct-v0.1", env = "VA_MODEL")]
    pub model: String,

    /// Number of prior turns sent along as context.
    #[setting(env = "VA_ATTENTION")]
    pub attention: usize,

    /// Base URL of the inference endpoint, usually the edge proxy.
    #[setting(default = "http://localhost:8787", env = "VA_ENDPOINT")]
    pub endpoint: String,

    /// Bearer token sent to the endpoint.
    ///
    /// Not needed when the endpoint is the edge proxy, which injects its own.
    #[setting(env = "VA_API_KEY")]
    pub api_key: Option<String>,

    /// Models offered for selection.
    #[setting(default = vec![
        String::from("@cf/mistral/mistral-7b-instruct-v0.1"),
        String::from("@cf/meta/llama-3.1-8b-instruct"),
        String::from("@cf/meta/llama-3.2-11b-vision-instruct"),
        String::from("@cf/qwen/qwen1.5-14b-chat-awq"),
    ])]
    pub models: Vec<String>,

    #[setting(nested)]
    pub agreement: AgreementConfig,

    #[setting(nested)]
    pub proxy: ProxyConfig,

    #[setting(nested)]
    pub speech: SpeechConfig,
}

impl AppConfig {
    /// Assign a single value, addressed by its dotted key.
    ///
    /// List values are given as a comma-separated string. Optional values are
    /// unset by assigning an empty string.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "model" => self.model = value.to_owned(),
            "attention" => self.attention = parse_number(key, value)?,
            "endpoint" => self.endpoint = value.to_owned(),
            "api_key" => self.api_key = parse_optional(value),
            "models" => self.models = parse_list(value),
            "agreement.gated_models" => self.agreement.gated_models = parse_list(value),
            "agreement.prompt" => self.agreement.prompt = value.to_owned(),
            "agreement.settle_delay_ms" => {
                self.agreement.settle_delay_ms = parse_number(key, value)?;
            }
            "proxy.account_id" => self.proxy.account_id = parse_optional(value),
            "proxy.gateway_id" => self.proxy.gateway_id = parse_optional(value),
            "proxy.api_key" => self.proxy.api_key = parse_optional(value),
            "proxy.upstream" => self.proxy.upstream = value.to_owned(),
            "proxy.listen" => self.proxy.listen = value.to_owned(),
            "speech.program" => self.speech.program = value.to_owned(),
            "speech.args" => {
                self.speech.args = parse_args(value);
            }
            "speech.listen_program" => self.speech.listen_program = parse_optional(value),
            "speech.listen_args" => self.speech.listen_args = parse_args(value),
            _ => {
                return Err(Error::UnknownConfigKey {
                    key: key.to_owned(),
                    available_keys: KEYS.to_vec(),
                });
            }
        }

        Ok(())
    }

    /// Apply `key=value` overrides, in order.
    pub fn apply_overrides<S: AsRef<str>>(&mut self, overrides: &[S]) -> Result<()> {
        for field in overrides {
            let field = field.as_ref();
            let (key, value) = field.split_once('=').unwrap_or((field, ""));
            self.set(key.trim(), value.trim())?;
        }

        Ok(())
    }
}

fn parse_number<T>(key: &str, value: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.parse().map_err(|error: T::Err| Error::InvalidConfigValue {
        key: key.to_owned(),
        value: value.to_owned(),
        reason: error.to_string(),
    })
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
        .collect()
}

fn parse_args(value: &str) -> Vec<String> {
    value.split_whitespace().map(str::to_owned).collect()
}

fn parse_optional(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_owned())
}
