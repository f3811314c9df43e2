pub mod payment;
pub mod remote;
pub mod repository;
pub mod storage;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    ValidationError(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Internal service error: {0}")]
    InternalError(String),
}

pub type CoreResult<T> = Result<T, CoreError>;

/// Error type used at repository and remote-service seams.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;
