//! Optimistic-concurrency strategy
//!
//! Applies a delta with a read-compute-conditional-write loop. Every retry
//! re-reads the latest state; a stale read is never reused, which is what
//! makes `Set` safe here: it always overwrites the most recently observed
//! baseline instead of stacking with intervening increments.
//!
//! Conflicts are resolved locally by retrying under the caller's
//! [`RetryPolicy`]; only an exhausted budget surfaces, as
//! `Error::RetriesExhausted` carrying the attempt count and the last state
//! observed.

use crate::retry::RetryPolicy;
use crate::LedgerOps;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tally_core::delta::{ApplyOutcome, CasOutcome, Delta};
use tally_core::error::{Error, Result};
use tally_core::record::Record;
use tally_core::traits::ConditionalWriteBackend;
use tally_core::types::{LedgerKey, VersionToken};

/// Counters accumulated across all operations on one store
///
/// `attempts` counts conditional writes issued; `conflicts` counts the ones
/// that lost the race. A store that never contends shows zero conflicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RetryMetrics {
    /// Conditional-write attempts issued
    pub attempts: u64,
    /// Attempts that returned a version conflict
    pub conflicts: u64,
}

/// Delta application via optimistic concurrency
///
/// Generic over any backend with conditional-write support. Stateless apart
/// from diagnostic counters; share via `Arc` or clone the handle per thread.
pub struct VersionedStore<B> {
    backend: Arc<B>,
    policy: RetryPolicy,
    attempts: AtomicU64,
    conflicts: AtomicU64,
}

impl<B: ConditionalWriteBackend> VersionedStore<B> {
    /// Create a store with the default retry policy
    pub fn new(backend: Arc<B>) -> Self {
        Self::with_policy(backend, RetryPolicy::default())
    }

    /// Create a store with an explicit default policy for [`LedgerOps::apply`]
    pub fn with_policy(backend: Arc<B>, policy: RetryPolicy) -> Self {
        VersionedStore {
            backend,
            policy,
            attempts: AtomicU64::new(0),
            conflicts: AtomicU64::new(0),
        }
    }

    /// The store's default retry policy
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Fetch current state and its version token
    ///
    /// Fails with `NotFound` if the key is absent.
    pub fn read(&self, key: &LedgerKey) -> Result<(Record, VersionToken)> {
        let stored = self
            .backend
            .read(key)?
            .ok_or_else(|| Error::NotFound { key: key.clone() })?;
        Ok((stored.record, stored.version))
    }

    /// One conditional application against an expected version
    ///
    /// Writes only if the stored token still equals `expected`; otherwise
    /// returns [`CasOutcome::Conflict`] with no side effect. Overflow and
    /// missing keys propagate immediately; they are not conflicts.
    pub fn try_apply(
        &self,
        key: &LedgerKey,
        delta: &Delta,
        expected: VersionToken,
    ) -> Result<CasOutcome> {
        let stored = self
            .backend
            .read(key)?
            .ok_or_else(|| Error::NotFound { key: key.clone() })?;
        if stored.version != expected {
            return Ok(CasOutcome::Conflict {
                actual: stored.version,
            });
        }
        let next = stored.record.apply(delta)?;
        self.record_attempt();
        let outcome = self.backend.write_if_version(key, next, expected)?;
        if let CasOutcome::Conflict { .. } = outcome {
            self.record_conflict();
        }
        Ok(outcome)
    }

    /// Apply a delta, retrying conflicts under `policy`
    ///
    /// Re-reads before every attempt. Returns the new version and the
    /// post-application value of the delta's field, or
    /// `RetriesExhausted { attempts, last_known }` once the budget is spent.
    /// `max_attempts == 0` fails immediately without reading or writing.
    pub fn apply_with_retry(
        &self,
        key: &LedgerKey,
        delta: &Delta,
        policy: &RetryPolicy,
    ) -> Result<ApplyOutcome> {
        self.apply_inner(key, delta, policy, None)
    }

    /// Like [`apply_with_retry`](Self::apply_with_retry), but also stops at
    /// `deadline` even if attempts remain
    pub fn apply_with_retry_until(
        &self,
        key: &LedgerKey,
        delta: &Delta,
        policy: &RetryPolicy,
        deadline: Instant,
    ) -> Result<ApplyOutcome> {
        self.apply_inner(key, delta, policy, Some(deadline))
    }

    fn apply_inner(
        &self,
        key: &LedgerKey,
        delta: &Delta,
        policy: &RetryPolicy,
        deadline: Option<Instant>,
    ) -> Result<ApplyOutcome> {
        let mut last_known: Option<Record> = None;
        let mut attempts: u32 = 0;

        while attempts < policy.max_attempts {
            if deadline.is_some_and(|d| Instant::now() >= d) {
                break;
            }
            attempts += 1;

            // Fresh read every attempt; the previous baseline is discarded.
            let stored = self
                .backend
                .read(key)?
                .ok_or_else(|| Error::NotFound { key: key.clone() })?;
            let next = stored.record.apply(delta)?;
            let value = next.get(delta.field()).unwrap_or(0);
            last_known = Some(stored.record);

            self.record_attempt();
            match self.backend.write_if_version(key, next, stored.version)? {
                CasOutcome::Applied(version) => {
                    return Ok(ApplyOutcome { version, value });
                }
                CasOutcome::Conflict { actual } => {
                    self.record_conflict();
                    tracing::debug!(
                        key = %key,
                        expected = %stored.version,
                        actual = %actual,
                        attempt = attempts,
                        "version conflict, retrying"
                    );
                    if attempts < policy.max_attempts {
                        let delay = policy.delay_for(attempts - 1);
                        if !delay.is_zero() {
                            std::thread::sleep(delay);
                        }
                    }
                }
            }
        }

        Err(Error::RetriesExhausted {
            key: key.clone(),
            attempts,
            last_known,
        })
    }

    /// Diagnostic counters for this store
    pub fn metrics(&self) -> RetryMetrics {
        RetryMetrics {
            attempts: self.attempts.load(Ordering::Relaxed),
            conflicts: self.conflicts.load(Ordering::Relaxed),
        }
    }

    fn record_attempt(&self) {
        self.attempts.fetch_add(1, Ordering::Relaxed);
    }

    fn record_conflict(&self) {
        self.conflicts.fetch_add(1, Ordering::Relaxed);
    }
}

impl<B: ConditionalWriteBackend> LedgerOps for VersionedStore<B> {
    fn apply(&self, key: &LedgerKey, delta: &Delta) -> Result<ApplyOutcome> {
        let policy = self.policy.clone();
        self.apply_with_retry(key, delta, &policy)
    }
}
