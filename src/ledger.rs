//! Main ledger entry point for Tally.
//!
//! This module provides the `Tally` struct, the primary entry point for
//! all ledger operations.

use crate::error::Result;
use crate::stores::{Atomic, Staging, Versioned};
use std::sync::Arc;
use tally_concurrency::{AtomicStore, RetryPolicy, StagedBulkMerge, VersionedStore};
use tally_core::record::{Record, VersionedRecord};
use tally_core::resolve::{ConflictResolver, TieBreak};
use tally_core::traits::ConditionalWriteBackend as _;
use tally_core::traits::ReadBackend as _;
use tally_core::types::{LedgerKey, LogicalTimestamp, VersionToken};
use tally_storage::MemoryBackend;

/// The Tally ledger.
///
/// This is the main entry point for all ledger operations. Create one with
/// [`Tally::in_memory`] or [`Tally::builder`], then pick the update strategy
/// that matches the workload:
///
/// - `versioned` applies read-modify-write deltas with optimistic
///   concurrency and bounded retry. Use it when an update depends on the
///   current value.
/// - `atomic` applies commutative increments with a single lock-free
///   operation. Use it for hot counters where updates never conflict.
/// - `staging` buffers bulk upserts and reconciles them in one
///   timestamp-resolved merge. Use it for batch ingestion.
///
/// All three operate on the same records, so strategies can be mixed per
/// operation.
///
/// # Example
///
/// ```ignore
/// use tallydb::prelude::*;
///
/// let ledger = Tally::in_memory();
/// ledger.create("account:1", Record::with_field("balance", 100))?;
///
/// ledger.versioned.decrement("account:1", "balance", 30)?;
/// ledger.atomic.increment("account:1", "balance", 5)?;
///
/// let stored = ledger.get("account:1")?.unwrap();
/// assert_eq!(stored.record.get("balance"), Some(75));
/// ```
pub struct Tally {
    /// The underlying in-memory backend
    pub(crate) backend: Arc<MemoryBackend>,

    /// Optimistic read-modify-write operations
    pub versioned: Versioned,

    /// Lock-free counter operations
    pub atomic: Atomic,

    /// Bulk ingestion and merge operations
    pub staging: Staging,
}

impl Tally {
    /// Create an in-memory ledger with default settings.
    ///
    /// All data is lost when the value is dropped.
    pub fn in_memory() -> Self {
        Self::builder().build()
    }

    /// Create a builder for ledger configuration.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let ledger = Tally::builder()
    ///     .retry_policy(RetryPolicy::new(10, Duration::from_millis(1)))
    ///     .build();
    /// ```
    pub fn builder() -> TallyBuilder {
        TallyBuilder::new()
    }

    /// Create a record, failing if the key already exists.
    ///
    /// The record starts at logical timestamp zero; use
    /// [`create_at`](Self::create_at) to seed a specific timestamp.
    pub fn create(&self, key: &str, fields: Record) -> Result<VersionToken> {
        self.create_at(key, fields, 0)
    }

    /// Create a record with an explicit logical timestamp.
    pub fn create_at(
        &self,
        key: &str,
        fields: Record,
        logical_timestamp: u64,
    ) -> Result<VersionToken> {
        let version = self.backend.insert(
            &LedgerKey::new(key),
            fields,
            LogicalTimestamp::new(logical_timestamp),
        )?;
        Ok(version)
    }

    /// Read a record with its version and timestamps.
    ///
    /// Returns `None` if the key doesn't exist.
    pub fn get(&self, key: &str) -> Result<Option<VersionedRecord>> {
        Ok(self.backend.read(&LedgerKey::new(key))?)
    }

    /// Delete a record.
    ///
    /// Returns `true` if the key existed.
    pub fn remove(&self, key: &str) -> Result<bool> {
        Ok(self.backend.remove(&LedgerKey::new(key))?)
    }

    /// Number of records in the primary store.
    pub fn record_count(&self) -> usize {
        self.backend.record_count()
    }
}

/// Builder for ledger configuration.
///
/// # Example
///
/// ```ignore
/// let ledger = Tally::builder()
///     .retry_policy(RetryPolicy::no_delay(100))
///     .tie_break(TieBreak::FirstIngested)
///     .build();
/// ```
pub struct TallyBuilder {
    policy: RetryPolicy,
    tie: TieBreak,
}

impl TallyBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        TallyBuilder {
            policy: RetryPolicy::default(),
            tie: TieBreak::default(),
        }
    }

    /// Set the retry policy used by the versioned strategy.
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set the tie-break policy for equal-timestamp rows in a merge batch.
    pub fn tie_break(mut self, tie: TieBreak) -> Self {
        self.tie = tie;
        self
    }

    /// Build the ledger.
    pub fn build(self) -> Tally {
        let backend = Arc::new(MemoryBackend::new());
        Tally {
            versioned: Versioned::new(VersionedStore::with_policy(
                Arc::clone(&backend),
                self.policy,
            )),
            atomic: Atomic::new(AtomicStore::new(Arc::clone(&backend))),
            staging: Staging::new(StagedBulkMerge::with_resolver(
                Arc::clone(&backend),
                ConflictResolver::new(self.tie),
            )),
            backend,
        }
    }
}

impl Default for TallyBuilder {
    fn default() -> Self {
        Self::new()
    }
}
