//! Error types for ImagenMax storage.

use imagenmax_core::LedgerError;

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur in storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database operation failed.
    #[error("database error: {0}")]
    Database(String),

    /// Stored bytes are not valid UTF-8.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<StoreError> for LedgerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Database(msg) => Self::Storage(msg),
            StoreError::Serialization(msg) => Self::Serialization(msg),
        }
    }
}
