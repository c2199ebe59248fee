//! Ledger API Comprehensive Test Suite
//!
//! This test suite exercises the public facade end to end: record
//! lifecycle, all three update strategies, and the cross-strategy
//! concurrency scenarios the crate exists to get right.
//!
//! ## Key Verification Points
//!
//! 1. No lost updates under contention, for every strategy
//! 2. Conflicts surface as values or typed errors, never as corruption
//! 3. Merges are atomic, idempotent, and timestamp-monotonic
//! 4. Retry budgets and deadlines are honored exactly
//!
//! ## Running Tests
//!
//! ```bash
//! # Run the whole suite
//! cargo test --test ledger_api_comprehensive
//!
//! # Run one strategy's tests only
//! cargo test --test ledger_api_comprehensive versioned::
//! ```

use tallydb::prelude::*;

pub mod scenarios;
pub mod staging;
pub mod versioned;

// =============================================================================
// SHARED TEST UTILITIES
// =============================================================================

/// Create a ledger with default settings
pub fn create_ledger() -> Tally {
    Tally::in_memory()
}

/// Create a ledger tuned for contention tests: a large retry budget with
/// no backoff sleeps, so threads spin instead of waiting
pub fn create_contended_ledger() -> Tally {
    Tally::builder()
        .retry_policy(RetryPolicy::no_delay(100_000))
        .build()
}

/// Create a record with a single seeded field
pub fn seed(ledger: &Tally, key: &str, field: &str, value: i64) {
    ledger
        .create(key, Record::with_field(field, value))
        .expect("seed record");
}

/// Read one field of a record, panicking if the key or field is absent
pub fn field_value(ledger: &Tally, key: &str, field: &str) -> i64 {
    ledger
        .get(key)
        .expect("read record")
        .unwrap_or_else(|| panic!("record '{}' missing", key))
        .record
        .get(field)
        .unwrap_or_else(|| panic!("field '{}' missing on '{}'", field, key))
}
