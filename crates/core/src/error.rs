use thiserror::Error;

pub type AdpulseResult<T> = Result<T, AdpulseError>;

#[derive(Error, Debug)]
pub enum AdpulseError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}
