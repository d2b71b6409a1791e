use thiserror::Error;

#[derive(Error, Debug)]
pub enum ShoutMapError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("No enclosing place found")]
    NotFound,

    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}
