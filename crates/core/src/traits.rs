//! Backend capability traits
//!
//! The ledger strategies are agnostic to what actually holds the data; they
//! require only the narrow capabilities below, received as already-configured
//! handles at construction time. These map naturally onto relational tables
//! with a row-version column ([`ConditionalWriteBackend`]), stores with
//! native atomic counters ([`AtomicBackend`]), and engines with MERGE
//! statements ([`StagingBackend`] + [`MergeBackend`]).

use crate::batch::{MergeReport, Upsert};
use crate::delta::CasOutcome;
use crate::error::Result;
use crate::record::{Record, VersionedRecord};
use crate::resolve::ConflictResolver;
use crate::types::{BatchId, LedgerKey, LogicalTimestamp, VersionToken};

/// Point read by key
pub trait ReadBackend: Send + Sync {
    /// Fetch the current record state, or `None` if the key is absent
    fn read(&self, key: &LedgerKey) -> Result<Option<VersionedRecord>>;
}

/// Conditional writes with version-token comparison
pub trait ConditionalWriteBackend: ReadBackend {
    /// Create a record under an application-generated key
    ///
    /// Fails with [`RecordExists`](crate::Error::RecordExists) if the key is
    /// already taken; records are created exactly once.
    fn insert(
        &self,
        key: &LedgerKey,
        record: Record,
        logical_timestamp: LogicalTimestamp,
    ) -> Result<VersionToken>;

    /// Write only if the stored version still equals `expected`
    ///
    /// Atomic with respect to concurrent writers. On mismatch nothing is
    /// written and the stored token is returned in
    /// [`CasOutcome::Conflict`]. Fails with
    /// [`NotFound`](crate::Error::NotFound) if the key vanished.
    fn write_if_version(
        &self,
        key: &LedgerKey,
        record: Record,
        expected: VersionToken,
    ) -> Result<CasOutcome>;

    /// Explicitly delete a record; returns whether it existed
    fn remove(&self, key: &LedgerKey) -> Result<bool>;
}

/// Backend-native atomic numeric increments
pub trait AtomicBackend: Send + Sync {
    /// Atomically add `amount` to `field`, returning the new value and the
    /// version token of the write
    ///
    /// No read-modify-write window: concurrent calls never lose updates.
    /// Fails with [`NotFound`](crate::Error::NotFound) if the key is absent;
    /// an absent field on an existing record starts from zero.
    fn fetch_add(&self, key: &LedgerKey, field: &str, amount: i64)
        -> Result<(i64, VersionToken)>;

    /// Create-or-update the given fields, for callers that need the key to
    /// exist before taking the atomic path
    fn upsert_record(&self, key: &LedgerKey, fields: Record) -> Result<VersionToken>;
}

/// Isolated staging areas for bulk ingestion
pub trait StagingBackend: Send + Sync {
    /// Allocate an isolated staging area
    fn create_area(&self, batch_id: &BatchId) -> Result<()>;

    /// Append one row; safe to call concurrently from multiple producers
    ///
    /// Returns the per-batch ingest sequence used for deterministic
    /// tie-breaking.
    fn append(&self, batch_id: &BatchId, upsert: Upsert) -> Result<u64>;

    /// Snapshot all rows with their ingest sequences
    fn snapshot_area(&self, batch_id: &BatchId) -> Result<Vec<(u64, Upsert)>>;

    /// Delete the staging area and its rows
    fn drop_area(&self, batch_id: &BatchId) -> Result<()>;
}

/// Atomic reconciliation into the primary store
pub trait MergeBackend: Send + Sync {
    /// Apply deduplicated rows in one all-or-nothing step
    ///
    /// Readers observe either none of the batch or all qualifying rows.
    /// Rows are classified against current primary state using `resolver`:
    /// absent key → insert, superseding timestamp → update, otherwise
    /// counted stale. Any failure leaves the primary store untouched.
    fn merge_records(&self, rows: &[Upsert], resolver: &ConflictResolver)
        -> Result<MergeReport>;
}
