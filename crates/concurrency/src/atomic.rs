//! Atomic-increment strategy
//!
//! Applies Increment/Decrement deltas with the backend's native atomic
//! numeric primitive. No read step, no version concept, no retry loop,
//! because the operation has no read-modify-write window to lose.
//!
//! `Set` is read-then-write by nature and cannot be made atomic here; it is
//! rejected with `UnsupportedOperation` and belongs on the versioned path.

use crate::LedgerOps;
use std::sync::Arc;
use tally_core::delta::{ApplyOutcome, Delta, DeltaKind};
use tally_core::error::{Error, Result};
use tally_core::record::Record;
use tally_core::traits::AtomicBackend;
use tally_core::types::{LedgerKey, VersionToken};

/// Delta application via backend-native atomic increments
///
/// Stateless with respect to retries; share via `Arc` freely.
pub struct AtomicStore<B> {
    backend: Arc<B>,
}

impl<B: AtomicBackend> AtomicStore<B> {
    /// Create a store over an atomic-capable backend
    pub fn new(backend: Arc<B>) -> Self {
        AtomicStore { backend }
    }

    /// Atomically add `amount` to `field`, returning the new value
    ///
    /// Succeeds unconditionally when the key exists; fails with `NotFound`
    /// otherwise. Callers wanting create-or-update semantics should call
    /// [`upsert`](Self::upsert) first.
    pub fn apply_atomic(&self, key: &LedgerKey, field: &str, amount: i64) -> Result<i64> {
        let (value, _) = self.backend.fetch_add(key, field, amount)?;
        Ok(value)
    }

    /// Create-or-update the given fields
    ///
    /// Thin wrapper over the backend upsert, for establishing a record
    /// before taking the atomic path.
    pub fn upsert(&self, key: &LedgerKey, fields: Record) -> Result<VersionToken> {
        self.backend.upsert_record(key, fields)
    }
}

impl<B: AtomicBackend> LedgerOps for AtomicStore<B> {
    fn apply(&self, key: &LedgerKey, delta: &Delta) -> Result<ApplyOutcome> {
        let amount = match delta.kind() {
            DeltaKind::Increment => delta.amount(),
            DeltaKind::Decrement => {
                delta.amount().checked_neg().ok_or_else(|| Error::Overflow {
                    field: delta.field().to_string(),
                })?
            }
            DeltaKind::Set => {
                return Err(Error::UnsupportedOperation {
                    reason: format!(
                        "set on field '{}' requires the versioned strategy",
                        delta.field()
                    ),
                });
            }
        };
        let (value, version) = self.backend.fetch_add(key, delta.field(), amount)?;
        Ok(ApplyOutcome { version, value })
    }
}
