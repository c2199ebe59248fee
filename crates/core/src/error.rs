//! Canonical error taxonomy for ledger operations
//!
//! Transient concurrency conflicts never appear here: a compare-and-swap
//! miss is a [`CasOutcome::Conflict`](crate::delta::CasOutcome) value, not an
//! error, and the retry path only surfaces [`Error::RetriesExhausted`] once
//! the budget is consumed. Everything in this enum is either a non-retryable
//! condition, a lifecycle misuse, or a backend failure with invariants
//! intact.

use crate::batch::BatchState;
use crate::record::Record;
use crate::types::{BatchId, LedgerKey};
use thiserror::Error;

/// All ledger errors
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// Key does not exist; non-retryable, surfaced immediately
    #[error("record not found: {key}")]
    NotFound {
        /// The missing key
        key: LedgerKey,
    },

    /// Create-once violation: the key already holds a record
    #[error("record already exists: {key}")]
    RecordExists {
        /// The colliding key
        key: LedgerKey,
    },

    /// Retry budget consumed without a successful conditional write
    ///
    /// Recoverable: the caller may re-invoke with a fresh attempt.
    /// `last_known` carries the most recently observed record state, if any
    /// read completed.
    #[error("retries exhausted after {attempts} attempts on {key}")]
    RetriesExhausted {
        /// The contended key
        key: LedgerKey,
        /// Attempts actually made
        attempts: u32,
        /// Most recently read state, for caller diagnostics
        last_known: Option<Record>,
    },

    /// Programmer error: the operation is not supported by this strategy
    #[error("unsupported operation: {reason}")]
    UnsupportedOperation {
        /// Why the operation was rejected
        reason: String,
    },

    /// A staging batch with this id already exists
    #[error("staging batch already exists: {batch_id}")]
    BatchAlreadyExists {
        /// The colliding batch id
        batch_id: BatchId,
    },

    /// No staging batch with this id
    #[error("staging batch not found: {batch_id}")]
    BatchNotFound {
        /// The unknown batch id
        batch_id: BatchId,
    },

    /// Ingestion attempted after the batch was sealed for merging
    #[error("staging batch is sealed: {batch_id} ({state})")]
    BatchSealed {
        /// The sealed batch id
        batch_id: BatchId,
        /// State at rejection time
        state: BatchState,
    },

    /// Discard attempted before the batch reached a terminal state
    #[error("staging batch not finalized: {batch_id} is {state}")]
    BatchNotFinalized {
        /// The batch id
        batch_id: BatchId,
        /// State at rejection time
        state: BatchState,
    },

    /// Backend failure during reconciliation
    ///
    /// The primary store is in its pre-merge state and the staging batch is
    /// intact; the whole merge is safe to retry as a unit.
    #[error("merge failed for batch {batch_id}: {reason}")]
    MergeFailed {
        /// The batch whose merge failed
        batch_id: BatchId,
        /// Backend-reported reason
        reason: String,
    },

    /// Checked arithmetic overflowed on a field
    #[error("numeric overflow on field {field}")]
    Overflow {
        /// The overflowing field
        field: String,
    },
}

/// Result type for ledger operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Whether a fresh invocation of the same call may succeed
    ///
    /// Exhausted retries and failed merges are recoverable; lifecycle misuse
    /// and missing entities are not.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::RetriesExhausted { .. } | Error::MergeFailed { .. }
        )
    }

    /// Whether this is a missing-entity error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. } | Error::BatchNotFound { .. })
    }

    /// Whether this is a programmer error (lifecycle or capability misuse)
    pub fn is_misuse(&self) -> bool {
        matches!(
            self,
            Error::UnsupportedOperation { .. }
                | Error::BatchAlreadyExists { .. }
                | Error::BatchSealed { .. }
                | Error::BatchNotFinalized { .. }
                | Error::RecordExists { .. }
        )
    }
}
