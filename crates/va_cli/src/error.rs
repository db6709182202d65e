use std::io;

pub(crate) type Result<T> = std::result::Result<T, Error>;

/// CLI Error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] va_config::Error),

    #[error(transparent)]
    Chat(#[from] va_chat::Error),

    #[error("Proxy error: {0}")]
    Proxy(#[from] va_proxy::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Speech program `{program}` failed: {error}")]
    Speech { program: String, error: io::Error },
}
