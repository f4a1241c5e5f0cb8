use thiserror::Error;

#[derive(Error, Debug)]
pub enum WstunnelServiceError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("Service error: {0}")]
    Service(#[from] ServiceError),

    #[error("System error: {message}")]
    System { message: String },
}

impl WstunnelServiceError {
    pub fn system<S: Into<String>>(message: S) -> Self {
        Self::System {
            message: message.into(),
        }
    }
}

/// Failure reported by the host service capability.
///
/// The message is the host's own text and is never rewritten, so it can be
/// shown to the user or logged as-is.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("{0}")]
    OperationFailed(String),
}

impl ServiceError {
    pub fn operation_failed<S: Into<String>>(message: S) -> Self {
        Self::OperationFailed(message.into())
    }

    pub fn message(&self) -> &str {
        match self {
            Self::OperationFailed(message) => message,
        }
    }
}

pub type Result<T> = std::result::Result<T, WstunnelServiceError>;
