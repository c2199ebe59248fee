//! Unified error types for Tally.
//!
//! This module wraps internal errors and presents a stable, flattened
//! interface to users of the facade.

use tally_core::record::Record;
use thiserror::Error;

/// All Tally errors.
///
/// This is the canonical error type for facade operations. Internal
/// errors from the storage and concurrency layers convert into it.
#[derive(Debug, Error)]
pub enum Error {
    /// Entity not found (ledger key or staging batch)
    #[error("not found: {0}")]
    NotFound(String),

    /// Attempted to create an entity that already exists
    #[error("already exists: {0}")]
    Exists(String),

    /// Optimistic write gave up after repeated version conflicts
    #[error("retries exhausted for '{key}' after {attempts} attempts")]
    RetriesExhausted {
        /// Contended key
        key: String,
        /// Conditional writes attempted before giving up
        attempts: u32,
        /// Most recent observed record, for diagnosis
        last_known: Option<Record>,
    },

    /// Arithmetic would exceed the i64 range
    #[error("overflow on field '{0}'")]
    Overflow(String),

    /// Operation not supported by the chosen strategy
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// Staging batch is in the wrong lifecycle state
    #[error("batch state error: {0}")]
    BatchState(String),

    /// Merge aborted; primary store untouched, batch retained
    #[error("merge failed: {0}")]
    MergeFailed(String),
}

/// Result type for Tally operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Check if this error may succeed when the operation is retried.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::RetriesExhausted { .. } | Error::MergeFailed(_)
        )
    }

    /// Check if this is a not-found error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }

    /// Check if this error came from write contention.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::RetriesExhausted { .. })
    }
}

// Convert from internal core errors
impl From<tally_core::error::Error> for Error {
    fn from(e: tally_core::error::Error) -> Self {
        use tally_core::error::Error as CoreError;
        match e {
            CoreError::NotFound { key } => Error::NotFound(key.to_string()),
            CoreError::RecordExists { key } => Error::Exists(key.to_string()),
            CoreError::RetriesExhausted {
                key,
                attempts,
                last_known,
            } => Error::RetriesExhausted {
                key: key.to_string(),
                attempts,
                last_known,
            },
            CoreError::UnsupportedOperation { reason } => Error::InvalidOperation(reason),
            CoreError::BatchAlreadyExists { batch_id } => Error::Exists(batch_id.to_string()),
            CoreError::BatchNotFound { batch_id } => Error::NotFound(batch_id.to_string()),
            CoreError::BatchSealed { batch_id, state } => {
                Error::BatchState(format!("batch '{}' is sealed ({})", batch_id, state))
            }
            CoreError::BatchNotFinalized { batch_id, state } => Error::BatchState(format!(
                "batch '{}' is not finalized ({})",
                batch_id, state
            )),
            CoreError::MergeFailed { batch_id, reason } => {
                Error::MergeFailed(format!("batch '{}': {}", batch_id, reason))
            }
            CoreError::Overflow { field } => Error::Overflow(field),
        }
    }
}
