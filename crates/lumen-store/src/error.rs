//! Store errors

use thiserror::Error;

/// Errors from a key-value store backend
#[derive(Debug, Error)]
pub enum StoreError {
    /// Backend unreachable or timed out
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Stored value could not be decoded
    #[error("corrupt value for key {key}")]
    Corrupt { key: String },
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;
