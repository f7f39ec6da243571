use std::{error::Error, fmt};

#[derive(Debug)]
pub enum ObjectStorageError {
    PresignConfig(Box<dyn Error + Send + Sync + 'static>),
    S3Error(Box<dyn Error + Send + Sync + 'static>),
    LockError(String),
}

impl std::error::Error for ObjectStorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        use ObjectStorageError::*;
        match self {
            PresignConfig(e) | S3Error(e) => Some(e.as_ref() as &dyn Error),
            _ => None,
        }
    }
}

impl fmt::Display for ObjectStorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use ObjectStorageError::*;
        match self {
            PresignConfig(e) => write!(f, "PresignConfig: {}", e),
            S3Error(e) => write!(f, "S3Error: {}", e),
            LockError(s) => write!(f, "LockError: {}", s),
        }
    }
}

/// Errors surfaced by the record services and turned into HTTP responses at
/// the handler boundary (see `api.rs`).
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),

    /// Covers both "absent" and "owned by someone else"; the message is the
    /// same for both.
    #[error("{kind} does not exist or you are not authorized to {action} the {}", .kind.to_lowercase())]
    NotFound {
        kind: &'static str,
        action: &'static str,
    },

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0:#}")]
    Store(#[from] anyhow::Error),

    #[error("{}", crate::unpack_error(.0))]
    ObjectStorage(#[from] ObjectStorageError),
}

impl ServiceError {
    pub fn missing_payload() -> Self {
        ServiceError::Validation("Request parameter is required but not provided.".to_string())
    }

    pub fn not_found(kind: &'static str, action: &'static str) -> Self {
        ServiceError::NotFound { kind, action }
    }
}
