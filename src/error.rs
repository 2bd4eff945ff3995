use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Config error: {0}")]
    ConfigError(#[from] toml::de::Error),
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Form is not ready to be submitted")]
    InvalidForm,
    #[error("A submission is already pending")]
    SubmissionPending,
    #[error("Session already completed")]
    SessionCompleted,
    #[error("Unknown event: {0}")]
    UnknownEvent(String),
    #[error("Transport error: {0}")]
    TransportError(String),
}

pub type Result<T> = std::result::Result<T, SessionError>;
