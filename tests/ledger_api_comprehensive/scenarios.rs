//! End-to-End Concurrency Scenarios
//!
//! Whole-workload tests that mirror how the ledger is used in production:
//! concurrent transfers between accounts, counter fan-in, and bulk
//! ingestion with out-of-order delivery.

use crate::*;
use rand::seq::SliceRandom;
use rand::thread_rng;
use std::sync::Arc;
use std::thread;

// =============================================================================
// TRANSFER SCENARIOS
// =============================================================================

/// Concurrent transfers between two accounts through the versioned
/// strategy. Every decrement and increment must survive contention; the
/// total across both accounts is conserved.
#[test]
fn test_concurrent_transfers_conserve_total() {
    let ledger = Arc::new(create_contended_ledger());
    seed(&ledger, "savings", "balance", 100_000);
    seed(&ledger, "checking", "balance", 0);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let ledger = Arc::clone(&ledger);
            thread::spawn(move || {
                for _ in 0..125 {
                    ledger.versioned.decrement("savings", "balance", 100).unwrap();
                    ledger.versioned.increment("checking", "balance", 100).unwrap();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(field_value(&ledger, "savings", "balance"), 0);
    assert_eq!(field_value(&ledger, "checking", "balance"), 100_000);
}

/// The same workload through the atomic strategy. Increments commute, so
/// the result is identical and no version conflict ever occurs.
#[test]
fn test_atomic_transfers_conserve_total_without_conflicts() {
    let ledger = Arc::new(create_ledger());
    seed(&ledger, "savings", "balance", 100_000);
    seed(&ledger, "checking", "balance", 0);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let ledger = Arc::clone(&ledger);
            thread::spawn(move || {
                for _ in 0..125 {
                    ledger.atomic.decrement("savings", "balance", 100).unwrap();
                    ledger.atomic.increment("checking", "balance", 100).unwrap();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(field_value(&ledger, "savings", "balance"), 0);
    assert_eq!(field_value(&ledger, "checking", "balance"), 100_000);

    let metrics = ledger.versioned.metrics();
    assert_eq!(metrics.conflicts, 0, "atomic path never takes the CAS loop");
    assert_eq!(metrics.attempts, 0);
}

// =============================================================================
// INGESTION SCENARIOS
// =============================================================================

/// Batches delivered out of order must converge to the newest data. Each
/// key's final value is determined by timestamp, not arrival order.
#[test]
fn test_out_of_order_batches_converge_to_newest() {
    let ledger = create_ledger();

    // Three generations of the same 10 keys, merged in shuffled order.
    let mut generations: Vec<u64> = vec![1, 2, 3];
    generations.shuffle(&mut thread_rng());

    for ts in generations {
        let batch = ledger.staging.create_generated("gen").unwrap();
        for k in 0..10 {
            ledger
                .staging
                .ingest(
                    &batch,
                    &format!("k{}", k),
                    Record::with_field("gen", ts as i64),
                    ts,
                )
                .unwrap();
        }
        ledger.staging.merge(&batch).unwrap();
        ledger.staging.discard(&batch).unwrap();
    }

    for k in 0..10 {
        assert_eq!(field_value(&ledger, &format!("k{}", k), "gen"), 3);
    }
    assert_eq!(ledger.record_count(), 10);
}

/// Producers stage concurrently, then a single merge lands everything at
/// once. Readers never observe a partially applied batch.
#[test]
fn test_parallel_producers_single_merge() {
    let ledger = Arc::new(create_ledger());
    let batch = ledger.staging.create("bulk").unwrap();

    let handles: Vec<_> = (0..4)
        .map(|p| {
            let ledger = Arc::clone(&ledger);
            let batch = batch.clone();
            thread::spawn(move || {
                for i in 0..50 {
                    ledger
                        .staging
                        .ingest(
                            &batch,
                            &format!("p{}:{}", p, i),
                            Record::with_field("v", i),
                            1,
                        )
                        .unwrap();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(ledger.record_count(), 0, "nothing visible before merge");
    let report = ledger.staging.merge(&batch).unwrap();
    assert_eq!(report.inserted, 200);
    assert_eq!(ledger.record_count(), 200);
}

// =============================================================================
// MIXED STRATEGY SCENARIOS
// =============================================================================

/// A record seeded by bulk ingestion keeps accepting live updates from
/// both interactive strategies.
#[test]
fn test_bulk_seed_then_live_updates() {
    let ledger = create_ledger();

    let batch = ledger.staging.create("seed").unwrap();
    ledger
        .staging
        .ingest(&batch, "acct", Record::with_field("balance", 1000), 1)
        .unwrap();
    ledger.staging.merge(&batch).unwrap();

    ledger.versioned.decrement("acct", "balance", 300).unwrap();
    ledger.atomic.increment("acct", "balance", 50).unwrap();

    assert_eq!(field_value(&ledger, "acct", "balance"), 750);
}
