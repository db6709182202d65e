//! Layered configuration for the chat client and the edge proxy.
//!
//! Values are resolved from built-in defaults, TOML files, environment
//! variables and finally `key=value` overrides given on the command line,
//! later layers taking precedence.

mod agreement;
mod config;
mod error;
mod load;
mod proxy;
mod speech;

pub use agreement::AgreementConfig;
pub use config::AppConfig;
pub use error::Error;
pub use load::{load, load_from_str, user_config_file};
pub use proxy::ProxyConfig;
pub use speech::SpeechConfig;
