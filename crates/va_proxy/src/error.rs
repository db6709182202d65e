pub(crate) type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Upstream error: {0}")]
    Upstream(#[from] reqwest::Error),

    #[error("Failed to read request body: {0}")]
    Body(#[from] axum::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid header: {0}")]
    Header(#[from] axum::http::header::InvalidHeaderValue),
}
