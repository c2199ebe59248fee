//! # Tally
//!
//! Concurrency-safe counters and ledgers with pluggable update strategies.
//!
//! Tally stores named records of integer fields and offers three ways to
//! update them concurrently, each with different contention behavior:
//!
//! - **Versioned** optimistic read-modify-write with bounded retry, for
//!   updates that depend on the current value.
//! - **Atomic** lock-free increments, for hot counters where updates
//!   commute and never conflict.
//! - **Staging** batched bulk upserts reconciled in one atomic,
//!   timestamp-resolved merge, for ingestion pipelines.
//!
//! ## Quick Start
//!
//! ```ignore
//! use tallydb::prelude::*;
//!
//! let ledger = Tally::in_memory();
//! ledger.create("account:1", Record::with_field("balance", 100))?;
//!
//! // Safe under contention: re-reads and retries on conflict
//! ledger.versioned.decrement("account:1", "balance", 30)?;
//!
//! // Lock-free: single atomic add, never conflicts
//! ledger.atomic.increment("account:1", "balance", 5)?;
//!
//! // Bulk: stage rows, merge once, newest timestamp wins
//! let batch = ledger.staging.create("import")?;
//! ledger.staging.ingest(&batch, "account:2", Record::with_field("balance", 50), 10)?;
//! ledger.staging.merge(&batch)?;
//! ```
//!
//! ## Choosing a strategy
//!
//! | Strategy | Conflict handling | Best for |
//! |----------|-------------------|----------|
//! | `versioned` | Detect and retry | Value-dependent updates |
//! | `atomic` | Cannot conflict | High-contention counters |
//! | `staging` | Timestamp resolution | Bulk ingestion |

#![warn(missing_docs)]

mod error;
mod ledger;
mod stores;

pub mod prelude;

// Re-export main entry points
pub use error::{Error, Result};
pub use ledger::{Tally, TallyBuilder};

// Re-export strategy facades
pub use stores::{Atomic, Staging, Versioned};

// Re-export core vocabulary
pub use tally_concurrency::{LedgerOps, RetryMetrics, RetryPolicy};
pub use tally_core::batch::{BatchState, MergeReport, Upsert};
pub use tally_core::delta::{ApplyOutcome, CasOutcome, Delta, DeltaKind};
pub use tally_core::record::{Record, VersionedRecord};
pub use tally_core::resolve::{ConflictResolver, TieBreak};
pub use tally_core::types::{BatchId, LedgerKey, LogicalTimestamp, VersionToken};
