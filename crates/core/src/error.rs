use thiserror::Error;

pub type MiaResult<T> = Result<T, MiaError>;

#[derive(Error, Debug)]
pub enum MiaError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<config::ConfigError> for MiaError {
    fn from(err: config::ConfigError) -> Self {
        MiaError::Config(err.to_string())
    }
}
