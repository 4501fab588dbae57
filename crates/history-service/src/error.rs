//! Error types for history requests.

use database::{DatabaseError, ValidationError};
use enhance_core::Credits;
use thiserror::Error;

/// Errors returned by [`HistoryHandler`](crate::HistoryHandler) operations.
#[derive(Debug, Error)]
pub enum HistoryError {
    /// The request was rejected before any state changed.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The entry does not exist, is deleted, or the caller may not see it.
    #[error("prompt history entry not found: {0}")]
    NotFound(String),

    /// The caller cannot afford the enhancement.
    #[error("Insufficient credits. Required: {required}, Available: {current}")]
    PaymentRequired { required: Credits, current: Credits },

    /// The provider or the ledger failed; the entry is unchanged.
    #[error("enhancement failed: {0}")]
    EnhancementFailed(String),

    /// A concurrent request changed the entry first.
    #[error("conflicting update: {0}")]
    Conflict(String),

    /// Storage failure.
    #[error("database error: {0}")]
    Database(DatabaseError),
}

impl From<DatabaseError> for HistoryError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound { id, .. } => HistoryError::NotFound(id),
            DatabaseError::Conflict { id, .. } => {
                HistoryError::Conflict(format!("entry {} was modified concurrently", id))
            }
            other => HistoryError::Database(other),
        }
    }
}

/// Result type for history operations.
pub type Result<T> = std::result::Result<T, HistoryError>;
