//! Convenient imports for Tally.
//!
//! Re-exports the most commonly used types so you can get started with a
//! single import:
//!
//! ```ignore
//! use tallydb::prelude::*;
//!
//! let ledger = Tally::in_memory();
//! ledger.create("key", Record::with_field("value", 1))?;
//! ```

// Main entry point
pub use crate::ledger::{Tally, TallyBuilder};

// Error handling
pub use crate::error::{Error, Result};

// Strategy facades
pub use crate::stores::{Atomic, Staging, Versioned};

// Record vocabulary
pub use tally_core::delta::{ApplyOutcome, CasOutcome, Delta};
pub use tally_core::record::{Record, VersionedRecord};
pub use tally_core::types::{BatchId, LedgerKey, LogicalTimestamp, VersionToken};

// Strategy configuration
pub use tally_concurrency::RetryPolicy;
pub use tally_core::resolve::TieBreak;

// Merge reporting
pub use tally_core::batch::{BatchState, MergeReport};
