//! Optimistic read-modify-write facade.
//!
//! Every update re-reads the record, applies the delta to the fresh copy,
//! and commits only if the version is unchanged. Conflicts retry with
//! exponential backoff up to the configured budget.
//!
//! # Example
//!
//! ```ignore
//! use tallydb::prelude::*;
//!
//! let ledger = Tally::in_memory();
//! ledger.create("account:1", Record::with_field("balance", 100))?;
//!
//! // Lost-update-safe even under contention
//! let outcome = ledger.versioned.decrement("account:1", "balance", 30)?;
//! assert_eq!(outcome.value, 70);
//! ```

use crate::error::Result;
use std::time::Instant;
use tally_concurrency::{RetryMetrics, VersionedStore};
use tally_core::delta::{ApplyOutcome, CasOutcome, Delta};
use tally_core::record::Record;
use tally_core::types::{LedgerKey, VersionToken};
use tally_storage::MemoryBackend;

/// Optimistic concurrency operations.
///
/// Access via `ledger.versioned`.
pub struct Versioned {
    store: VersionedStore<MemoryBackend>,
}

impl Versioned {
    pub(crate) fn new(store: VersionedStore<MemoryBackend>) -> Self {
        Self { store }
    }

    /// Increment a field, retrying version conflicts.
    ///
    /// Returns the new version and the field's post-increment value.
    pub fn increment(&self, key: &str, field: &str, amount: i64) -> Result<ApplyOutcome> {
        self.apply(key, &Delta::increment(field, amount))
    }

    /// Decrement a field, retrying version conflicts.
    pub fn decrement(&self, key: &str, field: &str, amount: i64) -> Result<ApplyOutcome> {
        self.apply(key, &Delta::decrement(field, amount))
    }

    /// Overwrite a field with an absolute value, retrying version conflicts.
    pub fn set(&self, key: &str, field: &str, value: i64) -> Result<ApplyOutcome> {
        self.apply(key, &Delta::set(field, value))
    }

    /// Apply an arbitrary delta under the configured retry policy.
    pub fn apply(&self, key: &str, delta: &Delta) -> Result<ApplyOutcome> {
        let policy = self.store.policy().clone();
        Ok(self
            .store
            .apply_with_retry(&LedgerKey::new(key), delta, &policy)?)
    }

    /// Apply a delta, stopping at `deadline` even if retry budget remains.
    pub fn apply_until(&self, key: &str, delta: &Delta, deadline: Instant) -> Result<ApplyOutcome> {
        let policy = self.store.policy().clone();
        Ok(self
            .store
            .apply_with_retry_until(&LedgerKey::new(key), delta, &policy, deadline)?)
    }

    /// Single conditional attempt with no retry.
    ///
    /// Returns [`CasOutcome::Conflict`] instead of retrying when the stored
    /// version no longer equals `expected`.
    pub fn try_apply(
        &self,
        key: &str,
        delta: &Delta,
        expected: VersionToken,
    ) -> Result<CasOutcome> {
        Ok(self.store.try_apply(&LedgerKey::new(key), delta, expected)?)
    }

    /// Read the current record and its version token.
    pub fn read(&self, key: &str) -> Result<(Record, VersionToken)> {
        Ok(self.store.read(&LedgerKey::new(key))?)
    }

    /// Cumulative attempt and conflict counters for this ledger.
    pub fn metrics(&self) -> RetryMetrics {
        self.store.metrics()
    }
}
