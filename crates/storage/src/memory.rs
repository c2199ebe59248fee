//! In-memory backend
//!
//! Reference implementation of the backend capability traits, used directly
//! by embedded callers and as the test double for strategy code.
//!
//! # Design
//!
//! - Primary table: `RwLock<FxHashMap>`; reads share the lock, conditional
//!   writes and merges take it exclusively. A merge classifies every row
//!   before writing anything, so readers see either the pre-merge or the
//!   post-merge table, never a partial one.
//! - Versions: one `AtomicU64` allocator; every successful mutation gets a
//!   fresh token, never reused.
//! - Staging: `DashMap` of per-batch areas. Ingest into different batches
//!   never contends; ingest into the same batch serializes only on that
//!   batch's row vector.

use chrono::Utc;
use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tally_core::batch::{MergeReport, Upsert};
use tally_core::delta::CasOutcome;
use tally_core::error::{Error, Result};
use tally_core::record::{Record, VersionedRecord};
use tally_core::resolve::ConflictResolver;
use tally_core::traits::{
    AtomicBackend, ConditionalWriteBackend, MergeBackend, ReadBackend, StagingBackend,
};
use tally_core::types::{BatchId, LedgerKey, LogicalTimestamp, VersionToken};

/// Rows staged for one batch, plus its ingest-sequence allocator
struct StagingArea {
    rows: Mutex<Vec<(u64, Upsert)>>,
    next_seq: AtomicU64,
}

impl StagingArea {
    fn new() -> Self {
        StagingArea {
            rows: Mutex::new(Vec::new()),
            next_seq: AtomicU64::new(0),
        }
    }
}

/// In-memory storage backend
///
/// Thread-safe; share via `Arc`.
pub struct MemoryBackend {
    primary: RwLock<FxHashMap<LedgerKey, VersionedRecord>>,
    version: AtomicU64,
    staging: DashMap<BatchId, StagingArea>,
}

impl MemoryBackend {
    /// Create an empty backend
    pub fn new() -> Self {
        MemoryBackend {
            primary: RwLock::new(FxHashMap::default()),
            version: AtomicU64::new(0),
            staging: DashMap::new(),
        }
    }

    /// Allocate the next version token
    ///
    /// Monotonic; a token handed out here is never reused.
    fn next_version(&self) -> VersionToken {
        VersionToken::from_raw(self.version.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Number of records in the primary store
    pub fn record_count(&self) -> usize {
        self.primary.read().len()
    }

    /// Number of live staging areas
    pub fn staging_area_count(&self) -> usize {
        self.staging.len()
    }

    fn stamp(record: Record, version: VersionToken, ts: LogicalTimestamp) -> VersionedRecord {
        VersionedRecord {
            record,
            version,
            logical_timestamp: ts,
            updated_at: Utc::now().timestamp(),
        }
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryBackend")
            .field("records", &self.record_count())
            .field("staging_areas", &self.staging_area_count())
            .finish()
    }
}

impl ReadBackend for MemoryBackend {
    fn read(&self, key: &LedgerKey) -> Result<Option<VersionedRecord>> {
        Ok(self.primary.read().get(key).cloned())
    }
}

impl ConditionalWriteBackend for MemoryBackend {
    fn insert(
        &self,
        key: &LedgerKey,
        record: Record,
        logical_timestamp: LogicalTimestamp,
    ) -> Result<VersionToken> {
        let mut primary = self.primary.write();
        if primary.contains_key(key) {
            return Err(Error::RecordExists { key: key.clone() });
        }
        let version = self.next_version();
        primary.insert(
            key.clone(),
            Self::stamp(record, version, logical_timestamp),
        );
        Ok(version)
    }

    fn write_if_version(
        &self,
        key: &LedgerKey,
        record: Record,
        expected: VersionToken,
    ) -> Result<CasOutcome> {
        let mut primary = self.primary.write();
        let stored = primary.get_mut(key).ok_or_else(|| Error::NotFound {
            key: key.clone(),
        })?;
        if stored.version != expected {
            return Ok(CasOutcome::Conflict {
                actual: stored.version,
            });
        }
        let version = self.next_version();
        stored.record = record;
        stored.version = version;
        stored.updated_at = Utc::now().timestamp();
        Ok(CasOutcome::Applied(version))
    }

    fn remove(&self, key: &LedgerKey) -> Result<bool> {
        Ok(self.primary.write().remove(key).is_some())
    }
}

impl AtomicBackend for MemoryBackend {
    fn fetch_add(
        &self,
        key: &LedgerKey,
        field: &str,
        amount: i64,
    ) -> Result<(i64, VersionToken)> {
        let mut primary = self.primary.write();
        let stored = primary.get_mut(key).ok_or_else(|| Error::NotFound {
            key: key.clone(),
        })?;
        let current = stored.record.get(field).unwrap_or(0);
        let value = current.checked_add(amount).ok_or_else(|| Error::Overflow {
            field: field.to_string(),
        })?;
        let version = self.next_version();
        stored.record.set(field, value);
        stored.version = version;
        stored.updated_at = Utc::now().timestamp();
        Ok((value, version))
    }

    fn upsert_record(&self, key: &LedgerKey, fields: Record) -> Result<VersionToken> {
        let mut primary = self.primary.write();
        let version = self.next_version();
        match primary.get_mut(key) {
            Some(stored) => {
                for (field, amount) in fields.iter() {
                    stored.record.set(field, amount);
                }
                stored.version = version;
                stored.updated_at = Utc::now().timestamp();
            }
            None => {
                primary.insert(
                    key.clone(),
                    Self::stamp(fields, version, LogicalTimestamp::default()),
                );
            }
        }
        Ok(version)
    }
}

impl StagingBackend for MemoryBackend {
    fn create_area(&self, batch_id: &BatchId) -> Result<()> {
        match self.staging.entry(batch_id.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(Error::BatchAlreadyExists {
                batch_id: batch_id.clone(),
            }),
            dashmap::mapref::entry::Entry::Vacant(vacant) => {
                vacant.insert(StagingArea::new());
                Ok(())
            }
        }
    }

    fn append(&self, batch_id: &BatchId, upsert: Upsert) -> Result<u64> {
        let area = self.staging.get(batch_id).ok_or_else(|| Error::BatchNotFound {
            batch_id: batch_id.clone(),
        })?;
        let seq = area.next_seq.fetch_add(1, Ordering::SeqCst);
        area.rows.lock().push((seq, upsert));
        Ok(seq)
    }

    fn snapshot_area(&self, batch_id: &BatchId) -> Result<Vec<(u64, Upsert)>> {
        let area = self.staging.get(batch_id).ok_or_else(|| Error::BatchNotFound {
            batch_id: batch_id.clone(),
        })?;
        let rows = area.rows.lock().clone();
        Ok(rows)
    }

    fn drop_area(&self, batch_id: &BatchId) -> Result<()> {
        self.staging
            .remove(batch_id)
            .map(|_| ())
            .ok_or_else(|| Error::BatchNotFound {
                batch_id: batch_id.clone(),
            })
    }
}

/// Planned effect of one merge row, computed before any write
enum MergePlan {
    Insert(LedgerKey, Record, LogicalTimestamp),
    Update(LedgerKey, Record, LogicalTimestamp),
    Skip,
}

impl MergeBackend for MemoryBackend {
    fn merge_records(
        &self,
        rows: &[Upsert],
        resolver: &ConflictResolver,
    ) -> Result<MergeReport> {
        let mut primary = self.primary.write();

        // Phase 1: classify every row against current state. No writes yet,
        // so any error here leaves the table untouched.
        let mut plans = Vec::with_capacity(rows.len());
        let mut report = MergeReport::default();
        for row in rows {
            match primary.get(&row.key) {
                None => {
                    report.inserted += 1;
                    plans.push(MergePlan::Insert(
                        row.key.clone(),
                        row.fields.clone(),
                        row.logical_timestamp,
                    ));
                }
                Some(stored) => {
                    if resolver.supersedes(row.logical_timestamp, stored.logical_timestamp) {
                        report.updated += 1;
                        plans.push(MergePlan::Update(
                            row.key.clone(),
                            row.fields.clone(),
                            row.logical_timestamp,
                        ));
                    } else {
                        report.skipped_stale += 1;
                        plans.push(MergePlan::Skip);
                    }
                }
            }
        }

        // Phase 2: commit. The exclusive lock is held across both phases, so
        // readers never observe a partially applied batch.
        for plan in plans {
            match plan {
                MergePlan::Insert(key, fields, ts) => {
                    let version = self.next_version();
                    primary.insert(key, Self::stamp(fields, version, ts));
                }
                MergePlan::Update(key, fields, ts) => {
                    let version = self.next_version();
                    // Key presence was established in phase 1 under this lock.
                    if let Some(stored) = primary.get_mut(&key) {
                        stored.record = fields;
                        stored.version = version;
                        stored.logical_timestamp = ts;
                        stored.updated_at = Utc::now().timestamp();
                    }
                }
                MergePlan::Skip => {}
            }
        }

        tracing::trace!(
            inserted = report.inserted,
            updated = report.updated,
            skipped_stale = report.skipped_stale,
            "merge applied to primary store"
        );
        Ok(report)
    }
}
