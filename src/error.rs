use thiserror::Error;

#[derive(Debug, Error)]
pub enum VisageError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Storage error: {0}")]
    StorageError(String),
    #[error("Generation error: {0}")]
    GenerationError(String),
    #[error("AWS error: {0}")]
    AwsError(String),
    #[error("Serialization error: {0}")]
    SerializationError(String),
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Coarse classification used at the HTTP boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    ClientInput,
    Configuration,
    Dependency,
    Internal,
}

impl VisageError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            VisageError::InvalidInput(_) => ErrorKind::ClientInput,
            VisageError::ConfigError(_) => ErrorKind::Configuration,
            VisageError::StorageError(_)
            | VisageError::GenerationError(_)
            | VisageError::AwsError(_) => ErrorKind::Dependency,
            VisageError::SerializationError(_) | VisageError::InternalError(_) => {
                ErrorKind::Internal
            }
        }
    }

    pub fn is_client_error(&self) -> bool {
        self.kind() == ErrorKind::ClientInput
    }

    /// Message without the variant prefix, suitable for a 400 body.
    pub fn detail(&self) -> &str {
        match self {
            VisageError::InvalidInput(msg)
            | VisageError::ConfigError(msg)
            | VisageError::StorageError(msg)
            | VisageError::GenerationError(msg)
            | VisageError::AwsError(msg)
            | VisageError::SerializationError(msg)
            | VisageError::InternalError(msg) => msg,
        }
    }
}

pub type Result<T> = std::result::Result<T, VisageError>;
