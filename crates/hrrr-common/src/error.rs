//! Error types shared by the HRRR extraction crates.

use thiserror::Error;

/// Result type alias using HrrrError.
pub type HrrrResult<T> = Result<T, HrrrError>;

/// Primary error type for shared operations.
#[derive(Debug, Error)]
pub enum HrrrError {
    #[error("Invalid run identity: {0}")]
    InvalidRun(String),

    #[error("Invalid time specification: {0}")]
    InvalidTime(String),

    #[error("Storage error: {0}")]
    StorageError(String),

}

impl HrrrError {
    /// Whether the error came from the object store rather than local input.
    pub fn is_storage(&self) -> bool {
        matches!(self, HrrrError::StorageError(_))
    }
}
