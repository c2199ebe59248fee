//! Staged bulk-merge strategy
//!
//! Ingests upserts from possibly-concurrent producers into an isolated
//! staging area, then reconciles them into the primary store in one
//! all-or-nothing merge.
//!
//! ## Lifecycle
//!
//! ```text
//! create_batch     ingest (n times)      merge                 discard
//! Created  ------> Populating  ------>  Merging ---> Committed ---> gone
//!                                              \---> Failed    ---> gone
//! ```
//!
//! A merge failure leaves the primary store untouched and the staging rows
//! intact; the whole merge is retried as a unit, never partially re-run.
//! Merging an already committed batch is idempotent: its rows classify as
//! stale on the second pass, so no duplicates are ever inserted.

use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Instant;
use tally_core::batch::{BatchState, MergeReport, Upsert};
use tally_core::error::{Error, Result};
use tally_core::resolve::ConflictResolver;
use tally_core::traits::{MergeBackend, StagingBackend};
use tally_core::types::BatchId;

/// Per-batch lifecycle state and merge serialization
struct BatchControl {
    state: Mutex<BatchState>,
    /// Held for the duration of a merge; callers merging the same batch
    /// block here, callers on other batches never touch it.
    merge_lock: Mutex<()>,
}

impl BatchControl {
    fn new() -> Self {
        BatchControl {
            state: Mutex::new(BatchState::Created),
            merge_lock: Mutex::new(()),
        }
    }
}

/// Bulk ingestion with conflict-resolved reconciliation
///
/// Generic over any backend providing staging areas and an atomic merge
/// primitive. Batches are independent: two batches over disjoint keys merge
/// concurrently without interference; overlapping batches are resolved
/// deterministically by timestamp comparison regardless of merge order.
pub struct StagedBulkMerge<B> {
    backend: Arc<B>,
    resolver: ConflictResolver,
    batches: DashMap<BatchId, Arc<BatchControl>>,
}

impl<B: StagingBackend + MergeBackend> StagedBulkMerge<B> {
    /// Create with the default conflict resolver
    pub fn new(backend: Arc<B>) -> Self {
        Self::with_resolver(backend, ConflictResolver::default())
    }

    /// Create with an explicit tie-break policy
    pub fn with_resolver(backend: Arc<B>, resolver: ConflictResolver) -> Self {
        StagedBulkMerge {
            backend,
            resolver,
            batches: DashMap::new(),
        }
    }

    /// The resolver used for dedup and supersession decisions
    pub fn resolver(&self) -> &ConflictResolver {
        &self.resolver
    }

    /// Allocate an isolated staging batch
    ///
    /// The id must be unique per run; collisions fail with
    /// `BatchAlreadyExists` (use `BatchId::generate` for a generation
    /// suffix).
    pub fn create_batch(&self, batch_id: &BatchId) -> Result<()> {
        self.backend.create_area(batch_id)?;
        self.batches
            .insert(batch_id.clone(), Arc::new(BatchControl::new()));
        tracing::debug!(batch = %batch_id, "staging batch created");
        Ok(())
    }

    /// Append one upsert to the batch
    ///
    /// Safe to call concurrently from multiple producers; no ordering is
    /// guaranteed between them. Rejected with `BatchSealed` once a merge
    /// has begun.
    pub fn ingest(&self, batch_id: &BatchId, upsert: Upsert) -> Result<u64> {
        let control = self.control(batch_id)?;
        let mut state = control.state.lock();
        if !state.accepts_ingest() {
            return Err(Error::BatchSealed {
                batch_id: batch_id.clone(),
                state: *state,
            });
        }
        let seq = self.backend.append(batch_id, upsert)?;
        *state = BatchState::Populating;
        Ok(seq)
    }

    /// Explicitly stop accepting rows
    ///
    /// Optional; [`merge`](Self::merge) seals implicitly. Idempotent from
    /// `ReadyToMerge`.
    pub fn seal(&self, batch_id: &BatchId) -> Result<()> {
        let control = self.control(batch_id)?;
        let mut state = control.state.lock();
        match *state {
            BatchState::Created | BatchState::Populating | BatchState::ReadyToMerge => {
                *state = BatchState::ReadyToMerge;
                Ok(())
            }
            other => Err(Error::BatchSealed {
                batch_id: batch_id.clone(),
                state: other,
            }),
        }
    }

    /// Reconcile the batch into the primary store
    ///
    /// Deduplicates rows per key (highest logical timestamp wins, ties per
    /// the resolver's policy), then applies them atomically: readers see
    /// either none or all qualifying rows. On failure the batch is marked
    /// `Failed`, the primary store keeps its pre-merge state, and the rows
    /// are retained so the whole merge can be retried or diagnosed.
    pub fn merge(&self, batch_id: &BatchId) -> Result<MergeReport> {
        self.merge_inner(batch_id, None)
    }

    /// Like [`merge`](Self::merge), but reports `MergeFailed` if `deadline`
    /// passes before the reconciliation step is reached
    pub fn merge_with_deadline(
        &self,
        batch_id: &BatchId,
        deadline: Instant,
    ) -> Result<MergeReport> {
        self.merge_inner(batch_id, Some(deadline))
    }

    fn merge_inner(
        &self,
        batch_id: &BatchId,
        deadline: Option<Instant>,
    ) -> Result<MergeReport> {
        let control = self.control(batch_id)?;
        // Serialize merges of this batch; other batches proceed untouched.
        let _merging = control.merge_lock.lock();

        *control.state.lock() = BatchState::Merging;

        let rows = match self.backend.snapshot_area(batch_id) {
            Ok(rows) => rows,
            Err(err) => {
                *control.state.lock() = BatchState::Failed;
                return Err(err);
            }
        };
        let winners = self.resolver.dedup(rows);

        if deadline.is_some_and(|d| Instant::now() >= d) {
            *control.state.lock() = BatchState::Failed;
            tracing::warn!(batch = %batch_id, "merge deadline exceeded before apply");
            return Err(Error::MergeFailed {
                batch_id: batch_id.clone(),
                reason: "deadline exceeded before apply".to_string(),
            });
        }

        match self.backend.merge_records(&winners, &self.resolver) {
            Ok(report) => {
                *control.state.lock() = BatchState::Committed;
                tracing::info!(
                    batch = %batch_id,
                    inserted = report.inserted,
                    updated = report.updated,
                    skipped_stale = report.skipped_stale,
                    "staging batch merged"
                );
                Ok(report)
            }
            Err(err) => {
                *control.state.lock() = BatchState::Failed;
                tracing::warn!(batch = %batch_id, error = %err, "merge failed, batch retained");
                Err(Error::MergeFailed {
                    batch_id: batch_id.clone(),
                    reason: err.to_string(),
                })
            }
        }
    }

    /// Delete the staging area
    ///
    /// Only legal once the batch is `Committed` or `Failed`; earlier calls
    /// fail with `BatchNotFinalized`.
    pub fn discard(&self, batch_id: &BatchId) -> Result<()> {
        let control = self.control(batch_id)?;
        let state = *control.state.lock();
        if !state.is_finalized() {
            return Err(Error::BatchNotFinalized {
                batch_id: batch_id.clone(),
                state,
            });
        }
        self.backend.drop_area(batch_id)?;
        self.batches.remove(batch_id);
        tracing::debug!(batch = %batch_id, "staging batch discarded");
        Ok(())
    }

    /// Current lifecycle state, for diagnosis
    pub fn status(&self, batch_id: &BatchId) -> Result<BatchState> {
        Ok(*self.control(batch_id)?.state.lock())
    }

    fn control(&self, batch_id: &BatchId) -> Result<Arc<BatchControl>> {
        self.batches
            .get(batch_id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| Error::BatchNotFound {
                batch_id: batch_id.clone(),
            })
    }
}
