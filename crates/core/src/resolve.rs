//! Conflict resolution for staged merges
//!
//! Two decisions happen during reconciliation, both made here so they stay
//! deterministic regardless of ingest or merge order:
//!
//! 1. **Intra-batch dedup**: a batch may hold several rows for one key
//!    (out-of-order or duplicate delivery). Per key, the row with the
//!    highest logical timestamp wins; equal timestamps are broken by the
//!    ingest sequence according to [`TieBreak`].
//! 2. **Primary supersession**: a deduplicated row overwrites the committed
//!    record only when its timestamp is strictly newer. A row with an equal
//!    timestamp is counted as stale, which makes re-merging an already
//!    committed batch idempotent.

use crate::batch::Upsert;
use crate::types::{LedgerKey, LogicalTimestamp};
use rustc_hash::FxHashMap;

/// Policy for equal-timestamp rows within one batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TieBreak {
    /// Prefer the row with the highest ingest sequence
    #[default]
    LastIngested,
    /// Prefer the row with the lowest ingest sequence
    FirstIngested,
}

/// Timestamp-comparison policy for staged merges
#[derive(Debug, Clone, Copy, Default)]
pub struct ConflictResolver {
    tie: TieBreak,
}

impl ConflictResolver {
    /// Resolver with the given intra-batch tie-break policy
    pub fn new(tie: TieBreak) -> Self {
        ConflictResolver { tie }
    }

    /// The configured tie-break policy
    pub fn tie_break(&self) -> TieBreak {
        self.tie
    }

    /// Whether an incoming row supersedes the committed record
    ///
    /// Strictly-newer wins. Equal timestamps keep the committed record, so a
    /// batch merged twice classifies its rows as stale the second time
    /// instead of rewriting them.
    pub fn supersedes(&self, incoming: LogicalTimestamp, existing: LogicalTimestamp) -> bool {
        incoming > existing
    }

    /// Collapse a batch to one winning row per key
    ///
    /// `rows` carries the per-batch ingest sequence assigned at append time.
    /// The winner per key has the maximum logical timestamp; timestamp ties
    /// fall back to the ingest sequence per [`TieBreak`], so concurrent
    /// producers always converge on the same winner. Output is sorted by key
    /// for stable merge ordering.
    pub fn dedup(&self, rows: Vec<(u64, Upsert)>) -> Vec<Upsert> {
        let mut winners: FxHashMap<LedgerKey, (u64, Upsert)> = FxHashMap::default();
        for (seq, row) in rows {
            match winners.get(&row.key) {
                Some((winner_seq, winner)) => {
                    if self.beats(
                        (row.logical_timestamp, seq),
                        (winner.logical_timestamp, *winner_seq),
                    ) {
                        winners.insert(row.key.clone(), (seq, row));
                    }
                }
                None => {
                    winners.insert(row.key.clone(), (seq, row));
                }
            }
        }
        let mut out: Vec<Upsert> = winners.into_values().map(|(_, row)| row).collect();
        out.sort_by(|a, b| a.key.cmp(&b.key));
        out
    }

    fn beats(
        &self,
        challenger: (LogicalTimestamp, u64),
        incumbent: (LogicalTimestamp, u64),
    ) -> bool {
        if challenger.0 != incumbent.0 {
            return challenger.0 > incumbent.0;
        }
        match self.tie {
            TieBreak::LastIngested => challenger.1 > incumbent.1,
            TieBreak::FirstIngested => challenger.1 < incumbent.1,
        }
    }
}
