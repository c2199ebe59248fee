//! Staging batch types
//!
//! Bulk ingestion stages [`Upsert`]s into an isolated, disposable area and
//! reconciles them into the primary store in one conflict-resolved merge.
//! [`BatchState`] tracks the batch lifecycle; [`MergeReport`] is the
//! caller-visible result of a merge.

use crate::record::Record;
use crate::types::{LedgerKey, LogicalTimestamp};
use serde::{Deserialize, Serialize};

/// One pending row in a staging batch
///
/// Carries the full target field set and the producer's logical timestamp.
/// Rows for the same key are deduplicated at merge time: the row with the
/// highest timestamp wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Upsert {
    /// Target record key
    pub key: LedgerKey,
    /// Field values to write if this row wins
    pub fields: Record,
    /// Producer-supplied ordering value
    pub logical_timestamp: LogicalTimestamp,
}

impl Upsert {
    /// Create an upsert row
    pub fn new(
        key: impl Into<LedgerKey>,
        fields: Record,
        logical_timestamp: impl Into<LogicalTimestamp>,
    ) -> Self {
        Upsert {
            key: key.into(),
            fields,
            logical_timestamp: logical_timestamp.into(),
        }
    }
}

/// Staging batch lifecycle state
///
/// ```text
/// Created -> Populating -> ReadyToMerge -> Merging -> Committed
///                                                  \-> Failed
/// ```
///
/// A failed batch keeps its rows for diagnosis and may be merged again as a
/// whole unit. Discard is only legal from `Committed` or `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BatchState {
    /// Allocated, no rows ingested yet
    Created,
    /// At least one row ingested
    Populating,
    /// Sealed; no further ingestion accepted
    ReadyToMerge,
    /// A merge is in progress
    Merging,
    /// Merge committed; rows are visible in the primary store
    Committed,
    /// Merge failed; primary store untouched, rows retained
    Failed,
}

impl BatchState {
    /// Whether the batch still accepts rows
    pub fn accepts_ingest(&self) -> bool {
        matches!(self, BatchState::Created | BatchState::Populating)
    }

    /// Whether the batch reached a terminal state
    pub fn is_finalized(&self) -> bool {
        matches!(self, BatchState::Committed | BatchState::Failed)
    }
}

impl std::fmt::Display for BatchState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            BatchState::Created => "created",
            BatchState::Populating => "populating",
            BatchState::ReadyToMerge => "ready-to-merge",
            BatchState::Merging => "merging",
            BatchState::Committed => "committed",
            BatchState::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

/// Per-merge accounting of what happened to each distinct key
///
/// Callers that ignore `skipped_stale` can silently drop data, so the report
/// is `#[must_use]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[must_use = "ignoring the report hides skipped (stale) rows"]
pub struct MergeReport {
    /// Keys absent from the primary store that were inserted
    pub inserted: usize,
    /// Keys whose incoming timestamp superseded the stored one
    pub updated: usize,
    /// Keys skipped because the stored timestamp was newer or equal
    pub skipped_stale: usize,
}

impl MergeReport {
    /// Total distinct keys considered by the merge
    pub fn total(&self) -> usize {
        self.inserted + self.updated + self.skipped_stale
    }
}
