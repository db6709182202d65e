//! Edge proxy configuration.

use schematic::Config;

/// Settings for `va serve`.
///
/// The credentials are usually provided through the environment, using the
/// same variable names as the Workers deployment.
#[derive(Debug, Clone, PartialEq, Config)]
#[config(rename_all = "snake_case")]
pub struct ProxyConfig {
    /// The account owning the AI gateway.
    #[setting(env = "CLOUDFLARE_AC_ID")]
    pub account_id: Option<String>,

    /// The AI gateway to route requests through.
    #[setting(env = "CLOUDFLARE_GATEWAY_ID")]
    pub gateway_id: Option<String>,

    /// API token injected as bearer credential.
    #[setting(env = "CLOUDFLARE_API_KEY")]
    pub api_key: Option<String>,

    /// Base URL of the upstream gateway.
    #[setting(default = "https://gateway.ai.cloudflare.com")]
    pub upstream: String,

    /// Address the proxy listens on.
    #[setting(default = "127.0.0.1:8787", env = "VA_PROXY_LISTEN")]
    pub listen: String,
}
