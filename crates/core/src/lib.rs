//! Core types for the tally ledger
//!
//! This crate defines the fundamental types shared across the system:
//! - [`LedgerKey`], [`VersionToken`], [`LogicalTimestamp`], [`BatchId`]
//! - [`Record`] and the pure [`Record::apply`] delta function
//! - [`Delta`] descriptors and conditional-write outcomes
//! - Backend capability traits implemented by storage
//! - [`ConflictResolver`] for staged-merge reconciliation
//! - The canonical [`Error`] taxonomy

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod batch;
pub mod delta;
pub mod error;
pub mod record;
pub mod resolve;
pub mod traits;
pub mod types;

pub use batch::{BatchState, MergeReport, Upsert};
pub use delta::{ApplyOutcome, CasOutcome, Delta, DeltaKind};
pub use error::{Error, Result};
pub use record::{Record, VersionedRecord};
pub use resolve::{ConflictResolver, TieBreak};
pub use traits::{
    AtomicBackend, ConditionalWriteBackend, MergeBackend, ReadBackend, StagingBackend,
};
pub use types::{BatchId, LedgerKey, LogicalTimestamp, VersionToken};
