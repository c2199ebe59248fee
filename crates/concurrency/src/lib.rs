//! Concurrency strategies for the tally ledger
//!
//! This crate implements the three interchangeable ways of applying deltas
//! safely under contention:
//! - [`VersionedStore`]: optimistic concurrency (read, compute, conditional
//!   write, retry on conflict)
//! - [`AtomicStore`]: backend-native atomic increments, no read step
//! - [`StagedBulkMerge`]: isolated staging plus one conflict-resolved merge
//!
//! [`RetryPolicy`] bounds the optimistic retry loop; ties and stale rows in
//! bulk merges are resolved by `tally_core::ConflictResolver`. The common
//! [`LedgerOps`] interface covers the single-delta strategies.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod atomic;
pub mod retry;
pub mod staged;
pub mod versioned;

pub use atomic::AtomicStore;
pub use retry::RetryPolicy;
pub use staged::StagedBulkMerge;
pub use versioned::{RetryMetrics, VersionedStore};

use tally_core::delta::{ApplyOutcome, Delta};
use tally_core::error::Result;
use tally_core::types::LedgerKey;

/// Common interface over the single-delta strategies
///
/// Callers that only need "apply this delta, make it stick" can hold a
/// `dyn LedgerOps` and swap the backing strategy freely. `Set` deltas are
/// accepted by the versioned strategy and rejected by the atomic one.
pub trait LedgerOps: Send + Sync {
    /// Apply one delta to one record, guaranteeing it is not lost
    fn apply(&self, key: &LedgerKey, delta: &Delta) -> Result<ApplyOutcome>;
}
