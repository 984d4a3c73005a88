use thiserror::Error;

#[derive(Debug, Error)]
pub enum EditError {
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Request error: {0}")]
    RequestError(String),
    #[error("Service error ({status}): {message}")]
    ServiceError { status: u16, message: String },
    #[error("Response error: {0}")]
    ResponseError(String),
    #[error("Serialization error: {0}")]
    SerializationError(String),
    #[error("Decode error: {0}")]
    DecodeError(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Session error: {0}")]
    SessionError(String),
}

pub type Result<T> = std::result::Result<T, EditError>;
