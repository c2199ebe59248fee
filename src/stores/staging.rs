//! Bulk ingestion facade.
//!
//! Rows accumulate in an isolated staging batch, then land in the primary
//! store through one all-or-nothing merge. Conflicts between staged rows
//! and existing records resolve by logical timestamp: newer data wins,
//! stale data is skipped and counted.
//!
//! # Example
//!
//! ```ignore
//! use tallydb::prelude::*;
//!
//! let ledger = Tally::in_memory();
//! let batch = ledger.staging.create("nightly-import")?;
//!
//! ledger.staging.ingest(&batch, "account:1", Record::with_field("balance", 50), 10)?;
//! ledger.staging.ingest(&batch, "account:2", Record::with_field("balance", 75), 10)?;
//!
//! let report = ledger.staging.merge(&batch)?;
//! assert_eq!(report.inserted, 2);
//! ledger.staging.discard(&batch)?;
//! ```

use crate::error::Result;
use std::time::Instant;
use tally_concurrency::StagedBulkMerge;
use tally_core::batch::{BatchState, MergeReport, Upsert};
use tally_core::record::Record;
use tally_core::types::BatchId;
use tally_storage::MemoryBackend;

/// Staged bulk-merge operations.
///
/// Access via `ledger.staging`.
pub struct Staging {
    store: StagedBulkMerge<MemoryBackend>,
}

impl Staging {
    pub(crate) fn new(store: StagedBulkMerge<MemoryBackend>) -> Self {
        Self { store }
    }

    /// Create a staging batch with a caller-chosen id.
    pub fn create(&self, id: &str) -> Result<BatchId> {
        let batch_id = BatchId::new(id);
        self.store.create_batch(&batch_id)?;
        Ok(batch_id)
    }

    /// Create a staging batch with a generated unique id.
    pub fn create_generated(&self, prefix: &str) -> Result<BatchId> {
        let batch_id = BatchId::generate(prefix);
        self.store.create_batch(&batch_id)?;
        Ok(batch_id)
    }

    /// Stage one upsert into the batch.
    ///
    /// Returns the row's ingest sequence, which breaks equal-timestamp
    /// ties at merge time.
    pub fn ingest(
        &self,
        batch: &BatchId,
        key: &str,
        fields: Record,
        logical_timestamp: u64,
    ) -> Result<u64> {
        Ok(self
            .store
            .ingest(batch, Upsert::new(key, fields, logical_timestamp))?)
    }

    /// Stop accepting rows without merging yet.
    pub fn seal(&self, batch: &BatchId) -> Result<()> {
        Ok(self.store.seal(batch)?)
    }

    /// Merge the batch into the primary store.
    ///
    /// Atomic and idempotent: a failed merge changes nothing and can be
    /// retried whole; a repeated merge skips its own rows as stale.
    pub fn merge(&self, batch: &BatchId) -> Result<MergeReport> {
        Ok(self.store.merge(batch)?)
    }

    /// Merge with a wall-clock deadline.
    pub fn merge_with_deadline(&self, batch: &BatchId, deadline: Instant) -> Result<MergeReport> {
        Ok(self.store.merge_with_deadline(batch, deadline)?)
    }

    /// Drop a committed or failed batch's staging area.
    pub fn discard(&self, batch: &BatchId) -> Result<()> {
        Ok(self.store.discard(batch)?)
    }

    /// Current lifecycle state of the batch.
    pub fn status(&self, batch: &BatchId) -> Result<BatchState> {
        Ok(self.store.status(batch)?)
    }
}
