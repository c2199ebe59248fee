//! Identifier types for the ledger
//!
//! This module defines the opaque identifiers used throughout the system:
//! - [`LedgerKey`]: application-generated record identifier
//! - [`VersionToken`]: write-detection token for optimistic concurrency
//! - [`LogicalTimestamp`]: application-supplied merge ordering value
//! - [`BatchId`]: staging batch identifier

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a ledger record
///
/// Keys are opaque and externally generated; the store never assigns them.
/// Uniqueness is the caller's responsibility.
///
/// # Examples
///
/// ```
/// use tally_core::types::LedgerKey;
///
/// let key = LedgerKey::new("account:alice");
/// assert_eq!(key.as_str(), "account:alice");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LedgerKey(String);

impl LedgerKey {
    /// Create a key from an application-generated identifier
    pub fn new(key: impl Into<String>) -> Self {
        LedgerKey(key.into())
    }

    /// Borrow the raw key string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for LedgerKey {
    fn from(s: &str) -> Self {
        LedgerKey::new(s)
    }
}

impl From<String> for LedgerKey {
    fn from(s: String) -> Self {
        LedgerKey(s)
    }
}

impl std::fmt::Display for LedgerKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque marker that changes on every successful write
///
/// Used by the optimistic-concurrency path to detect lost-update races.
/// Tokens support equality comparison only; the numeric content is an
/// implementation detail backed by a monotonic counter and is never reused
/// for the lifetime of a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VersionToken(u64);

impl VersionToken {
    /// Wrap a raw counter value
    ///
    /// Only storage backends should construct tokens; callers treat them
    /// as opaque.
    pub fn from_raw(raw: u64) -> Self {
        VersionToken(raw)
    }

    /// Raw counter value, for backend bookkeeping and diagnostics
    pub fn as_raw(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for VersionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Application-supplied ordering value for merge conflict resolution
///
/// Not necessarily wall-clock time; any monotonic-per-producer value works
/// (sequence numbers, hybrid clocks). Staged merges compare these to decide
/// whether an incoming row supersedes the committed one.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct LogicalTimestamp(u64);

impl LogicalTimestamp {
    /// Wrap an application ordering value
    pub fn new(ts: u64) -> Self {
        LogicalTimestamp(ts)
    }

    /// Raw ordering value
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl From<u64> for LogicalTimestamp {
    fn from(ts: u64) -> Self {
        LogicalTimestamp(ts)
    }
}

impl std::fmt::Display for LogicalTimestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "t{}", self.0)
    }
}

/// Unique identifier for a staging batch
///
/// Batch ids must be unique per ingest run; reusing an id fails with
/// [`BatchAlreadyExists`](crate::Error::BatchAlreadyExists). Callers may
/// supply their own ids or use [`BatchId::generate`] for a collision-free
/// generation suffix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BatchId(String);

impl BatchId {
    /// Create a batch id from a caller-supplied string
    pub fn new(id: impl Into<String>) -> Self {
        BatchId(id.into())
    }

    /// Generate a batch id with a random generation suffix
    ///
    /// # Examples
    ///
    /// ```
    /// use tally_core::types::BatchId;
    ///
    /// let a = BatchId::generate("nightly-load");
    /// let b = BatchId::generate("nightly-load");
    /// assert_ne!(a, b);
    /// ```
    pub fn generate(prefix: &str) -> Self {
        BatchId(format!("{}-{}", prefix, Uuid::new_v4().simple()))
    }

    /// Borrow the raw id string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for BatchId {
    fn from(s: &str) -> Self {
        BatchId::new(s)
    }
}

impl std::fmt::Display for BatchId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
