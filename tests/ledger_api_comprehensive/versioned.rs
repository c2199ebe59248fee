//! Versioned Strategy Facade Tests
//!
//! Tests for optimistic read-modify-write operations: increment,
//! decrement, set, single-shot CAS, and retry exhaustion.

use crate::*;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

// =============================================================================
// BASIC DELTA TESTS
// =============================================================================

#[test]
fn test_increment_returns_new_value_and_version() {
    let ledger = create_ledger();
    seed(&ledger, "acct", "balance", 100);

    let outcome = ledger.versioned.increment("acct", "balance", 25).unwrap();
    assert_eq!(outcome.value, 125);
    assert_eq!(field_value(&ledger, "acct", "balance"), 125);
}

#[test]
fn test_decrement_below_zero_allowed() {
    let ledger = create_ledger();
    seed(&ledger, "acct", "balance", 10);

    let outcome = ledger.versioned.decrement("acct", "balance", 30).unwrap();
    assert_eq!(outcome.value, -20);
}

#[test]
fn test_set_overwrites_regardless_of_current() {
    let ledger = create_ledger();
    seed(&ledger, "acct", "balance", 999);

    let outcome = ledger.versioned.set("acct", "balance", 7).unwrap();
    assert_eq!(outcome.value, 7);
}

#[test]
fn test_delta_on_absent_field_starts_from_zero() {
    let ledger = create_ledger();
    seed(&ledger, "acct", "balance", 100);

    let outcome = ledger.versioned.increment("acct", "bonus", 5).unwrap();
    assert_eq!(outcome.value, 5);
    // The original field is untouched.
    assert_eq!(field_value(&ledger, "acct", "balance"), 100);
}

#[test]
fn test_missing_key_fails() {
    let ledger = create_ledger();
    let err = ledger.versioned.increment("ghost", "balance", 1).unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn test_version_advances_per_write() {
    let ledger = create_ledger();
    seed(&ledger, "acct", "balance", 0);

    let first = ledger.versioned.increment("acct", "balance", 1).unwrap();
    let second = ledger.versioned.increment("acct", "balance", 1).unwrap();
    assert_ne!(second.version, first.version);
}

// =============================================================================
// SINGLE-SHOT CAS TESTS
// =============================================================================

#[test]
fn test_try_apply_with_current_version_succeeds() {
    let ledger = create_ledger();
    seed(&ledger, "acct", "balance", 50);

    let (_, version) = ledger.versioned.read("acct").unwrap();
    let outcome = ledger
        .versioned
        .try_apply("acct", &Delta::increment("balance", 10), version)
        .unwrap();
    assert!(outcome.is_applied());
    assert_eq!(field_value(&ledger, "acct", "balance"), 60);
}

#[test]
fn test_try_apply_with_stale_version_is_conflict_not_error() {
    let ledger = create_ledger();
    seed(&ledger, "acct", "balance", 50);

    let (_, stale) = ledger.versioned.read("acct").unwrap();
    ledger.versioned.increment("acct", "balance", 1).unwrap();

    let outcome = ledger
        .versioned
        .try_apply("acct", &Delta::increment("balance", 10), stale)
        .unwrap();
    match outcome {
        CasOutcome::Conflict { actual } => assert_ne!(actual, stale),
        CasOutcome::Applied(_) => panic!("stale CAS must not apply"),
    }
    // The conflicting write had no side effect.
    assert_eq!(field_value(&ledger, "acct", "balance"), 51);
}

// =============================================================================
// RETRY AND EXHAUSTION TESTS
// =============================================================================

#[test]
fn test_zero_attempt_budget_fails_without_writing() {
    let ledger = Tally::builder().retry_policy(RetryPolicy::no_delay(0)).build();
    seed(&ledger, "acct", "balance", 100);

    let err = ledger.versioned.increment("acct", "balance", 1).unwrap_err();
    match err {
        Error::RetriesExhausted { attempts, .. } => assert_eq!(attempts, 0),
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(field_value(&ledger, "acct", "balance"), 100);
}

#[test]
fn test_exhaustion_reports_last_known_record() {
    let ledger = Tally::builder().retry_policy(RetryPolicy::no_delay(0)).build();
    seed(&ledger, "acct", "balance", 42);

    let err = ledger.versioned.increment("acct", "balance", 1).unwrap_err();
    assert!(err.is_retryable());
    match err {
        Error::RetriesExhausted { last_known, .. } => {
            // Budget zero means no read happened either.
            assert!(last_known.is_none());
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_deadline_in_past_fails_immediately() {
    let ledger = create_ledger();
    seed(&ledger, "acct", "balance", 100);

    let err = ledger
        .versioned
        .apply_until(
            "acct",
            &Delta::increment("balance", 1),
            Instant::now() - Duration::from_millis(1),
        )
        .unwrap_err();
    assert!(err.is_conflict());
    assert_eq!(field_value(&ledger, "acct", "balance"), 100);
}

#[test]
fn test_overflow_is_terminal_not_retried() {
    let ledger = create_ledger();
    seed(&ledger, "acct", "balance", i64::MAX);

    let err = ledger.versioned.increment("acct", "balance", 1).unwrap_err();
    assert!(matches!(err, Error::Overflow(_)));
    assert!(!err.is_retryable());
    assert_eq!(field_value(&ledger, "acct", "balance"), i64::MAX);
}

// =============================================================================
// CONTENTION TESTS
// =============================================================================

#[test]
fn test_concurrent_increments_lose_nothing() {
    let ledger = Arc::new(create_contended_ledger());
    seed(&ledger, "hot", "count", 0);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let ledger = Arc::clone(&ledger);
            thread::spawn(move || {
                for _ in 0..100 {
                    ledger.versioned.increment("hot", "count", 1).unwrap();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(field_value(&ledger, "hot", "count"), 800);
    let metrics = ledger.versioned.metrics();
    assert!(metrics.attempts >= 800, "one attempt minimum per success");
}
