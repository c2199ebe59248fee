//! Staging Strategy Facade Tests
//!
//! Tests for batch lifecycle, timestamp-resolved merges, and merge
//! atomicity guarantees.

use crate::*;
use proptest::prelude::*;
use std::time::{Duration, Instant};

// =============================================================================
// LIFECYCLE TESTS
// =============================================================================

#[test]
fn test_batch_lifecycle_happy_path() {
    let ledger = create_ledger();

    let batch = ledger.staging.create("import").unwrap();
    assert_eq!(ledger.staging.status(&batch).unwrap(), BatchState::Created);

    ledger
        .staging
        .ingest(&batch, "k1", Record::with_field("v", 1), 1)
        .unwrap();
    assert_eq!(ledger.staging.status(&batch).unwrap(), BatchState::Populating);

    ledger.staging.seal(&batch).unwrap();
    ledger.staging.merge(&batch).unwrap();
    assert_eq!(ledger.staging.status(&batch).unwrap(), BatchState::Committed);

    ledger.staging.discard(&batch).unwrap();
    assert!(ledger.staging.status(&batch).unwrap_err().is_not_found());
}

#[test]
fn test_generated_batch_ids_are_unique() {
    let ledger = create_ledger();
    let a = ledger.staging.create_generated("import").unwrap();
    let b = ledger.staging.create_generated("import").unwrap();
    assert_ne!(a, b);
    assert!(a.as_str().starts_with("import-"));
}

#[test]
fn test_duplicate_batch_id_rejected() {
    let ledger = create_ledger();
    ledger.staging.create("b").unwrap();
    let err = ledger.staging.create("b").unwrap_err();
    assert!(matches!(err, Error::Exists(_)));
}

#[test]
fn test_ingest_after_seal_rejected() {
    let ledger = create_ledger();
    let batch = ledger.staging.create("b").unwrap();
    ledger.staging.seal(&batch).unwrap();

    let err = ledger
        .staging
        .ingest(&batch, "k", Record::new(), 1)
        .unwrap_err();
    assert!(matches!(err, Error::BatchState(_)));
}

#[test]
fn test_discard_requires_finalized_batch() {
    let ledger = create_ledger();
    let batch = ledger.staging.create("b").unwrap();

    let err = ledger.staging.discard(&batch).unwrap_err();
    assert!(matches!(err, Error::BatchState(_)));
}

// =============================================================================
// MERGE RESOLUTION TESTS
// =============================================================================

#[test]
fn test_merge_classifies_inserts_updates_and_stale() {
    let ledger = create_ledger();
    ledger
        .create_at("existing", Record::with_field("v", 1), 10)
        .unwrap();
    ledger
        .create_at("ahead", Record::with_field("v", 1), 100)
        .unwrap();

    let batch = ledger.staging.create("b").unwrap();
    ledger
        .staging
        .ingest(&batch, "fresh", Record::with_field("v", 2), 50)
        .unwrap();
    ledger
        .staging
        .ingest(&batch, "existing", Record::with_field("v", 2), 50)
        .unwrap();
    ledger
        .staging
        .ingest(&batch, "ahead", Record::with_field("v", 2), 50)
        .unwrap();

    let report = ledger.staging.merge(&batch).unwrap();
    assert_eq!(report.inserted, 1);
    assert_eq!(report.updated, 1);
    assert_eq!(report.skipped_stale, 1);
    assert_eq!(report.total(), 3);

    assert_eq!(field_value(&ledger, "fresh", "v"), 2);
    assert_eq!(field_value(&ledger, "existing", "v"), 2);
    assert_eq!(field_value(&ledger, "ahead", "v"), 1, "stale row ignored");
}

#[test]
fn test_intra_batch_duplicates_resolved_before_merge() {
    let ledger = create_ledger();
    let batch = ledger.staging.create("b").unwrap();
    ledger
        .staging
        .ingest(&batch, "k1", Record::with_field("v", 10), 5)
        .unwrap();
    ledger
        .staging
        .ingest(&batch, "k1", Record::with_field("v", 99), 3)
        .unwrap();

    let report = ledger.staging.merge(&batch).unwrap();
    assert_eq!(report.total(), 1, "one row per key reaches the store");
    assert_eq!(field_value(&ledger, "k1", "v"), 10);
}

#[test]
fn test_merge_replaces_record_wholesale() {
    let ledger = create_ledger();
    ledger
        .create_at(
            "k",
            Record::from_fields([("old", 1), ("shared", 1)]),
            1,
        )
        .unwrap();

    let batch = ledger.staging.create("b").unwrap();
    ledger
        .staging
        .ingest(&batch, "k", Record::with_field("shared", 2), 5)
        .unwrap();
    ledger.staging.merge(&batch).unwrap();

    let stored = ledger.get("k").unwrap().unwrap();
    assert_eq!(stored.record.get("shared"), Some(2));
    assert_eq!(stored.record.get("old"), None, "upserts replace, not patch");
}

#[test]
fn test_merge_idempotent_on_repeat() {
    let ledger = create_ledger();
    let batch = ledger.staging.create("b").unwrap();
    ledger
        .staging
        .ingest(&batch, "k1", Record::with_field("v", 10), 5)
        .unwrap();

    let first = ledger.staging.merge(&batch).unwrap();
    assert_eq!(first.inserted, 1);

    let second = ledger.staging.merge(&batch).unwrap();
    assert_eq!(second.inserted, 0);
    assert_eq!(second.updated, 0);
    assert_eq!(second.skipped_stale, 1);
    assert_eq!(field_value(&ledger, "k1", "v"), 10);
}

#[test]
fn test_deadline_failure_keeps_batch_retryable() {
    let ledger = create_ledger();
    let batch = ledger.staging.create("b").unwrap();
    ledger
        .staging
        .ingest(&batch, "k1", Record::with_field("v", 10), 5)
        .unwrap();

    let err = ledger
        .staging
        .merge_with_deadline(&batch, Instant::now() - Duration::from_millis(1))
        .unwrap_err();
    assert!(matches!(err, Error::MergeFailed(_)));
    assert!(err.is_retryable());
    assert!(ledger.get("k1").unwrap().is_none(), "nothing partially applied");
    assert_eq!(ledger.staging.status(&batch).unwrap(), BatchState::Failed);

    // The retained rows merge cleanly on retry.
    let report = ledger.staging.merge(&batch).unwrap();
    assert_eq!(report.inserted, 1);
}

// =============================================================================
// SERIALIZATION TESTS
// =============================================================================

#[test]
fn test_merge_report_serializes_for_diagnostics() {
    let report = MergeReport {
        inserted: 3,
        updated: 2,
        skipped_stale: 1,
    };
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["inserted"], 3);
    assert_eq!(json["skipped_stale"], 1);
}

// =============================================================================
// PROPERTY TESTS
// =============================================================================

proptest! {
    /// Whatever timestamps a batch carries, the stored record for each key
    /// ends with that key's maximum staged timestamp.
    #[test]
    fn prop_merge_keeps_max_timestamp_per_key(
        rows in proptest::collection::vec((0u8..4, 1u64..100), 1..20)
    ) {
        let ledger = create_ledger();
        let batch = ledger.staging.create("prop").unwrap();

        let mut expected: std::collections::HashMap<u8, u64> = std::collections::HashMap::new();
        for (key_idx, ts) in rows {
            let key = format!("k{}", key_idx);
            ledger
                .staging
                .ingest(&batch, &key, Record::with_field("ts", ts as i64), ts)
                .unwrap();
            let max = expected.entry(key_idx).or_insert(0);
            *max = (*max).max(ts);
        }
        ledger.staging.merge(&batch).unwrap();

        for (key_idx, max_ts) in expected {
            let key = format!("k{}", key_idx);
            let stored = ledger.get(&key).unwrap().unwrap();
            prop_assert_eq!(stored.logical_timestamp, LogicalTimestamp::new(max_ts));
        }
    }
}
