//! Lock-free counter facade.
//!
//! Increments commute, so they apply with a single atomic operation and
//! never conflict. There is no retry loop and no read-before-write; under
//! heavy contention this strategy does strictly less work than the
//! versioned one.
//!
//! Absolute writes do not commute and are rejected; route them through
//! `ledger.versioned` instead.
//!
//! # Example
//!
//! ```ignore
//! use tallydb::prelude::*;
//!
//! let ledger = Tally::in_memory();
//! ledger.create("page:home", Record::with_field("hits", 0))?;
//!
//! let total = ledger.atomic.increment("page:home", "hits", 1)?;
//! assert_eq!(total, 1);
//! ```

use crate::error::{Error, Result};
use tally_concurrency::AtomicStore;
use tally_core::record::Record;
use tally_core::types::{LedgerKey, VersionToken};
use tally_storage::MemoryBackend;

/// Atomic counter operations.
///
/// Access via `ledger.atomic`.
pub struct Atomic {
    store: AtomicStore<MemoryBackend>,
}

impl Atomic {
    pub(crate) fn new(store: AtomicStore<MemoryBackend>) -> Self {
        Self { store }
    }

    /// Atomically add to a field, returning the new total.
    ///
    /// The key must already exist.
    pub fn increment(&self, key: &str, field: &str, amount: i64) -> Result<i64> {
        Ok(self.store.apply_atomic(&LedgerKey::new(key), field, amount)?)
    }

    /// Atomically subtract from a field, returning the new total.
    pub fn decrement(&self, key: &str, field: &str, amount: i64) -> Result<i64> {
        let negated = amount
            .checked_neg()
            .ok_or_else(|| Error::Overflow(field.to_string()))?;
        Ok(self.store.apply_atomic(&LedgerKey::new(key), field, negated)?)
    }

    /// Create or update the given fields, leaving other fields untouched.
    pub fn upsert(&self, key: &str, fields: Record) -> Result<VersionToken> {
        Ok(self.store.upsert(&LedgerKey::new(key), fields)?)
    }
}
