//! Bounded exponential backoff for the optimistic path
//!
//! Unbounded retry is a defect, not a feature: every loop driven by this
//! policy stops after `max_attempts` (or a caller deadline) and surfaces
//! `RetriesExhausted` instead of spinning forever.

use std::time::Duration;

/// Retry budget and backoff schedule
///
/// The delay before retry `n` (zero-based) is
/// `base_delay * multiplier^n`, capped at `max_delay`.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use tally_concurrency::RetryPolicy;
///
/// let policy = RetryPolicy::default();
/// assert_eq!(policy.max_attempts, 5);
/// assert!(policy.delay_for(0) < policy.delay_for(3));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Maximum conditional-write attempts; 0 means fail without trying
    pub max_attempts: u32,
    /// Delay before the first retry
    pub base_delay: Duration,
    /// Growth factor per retry
    pub multiplier: f64,
    /// Upper bound on any single delay
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    /// 5 attempts, 10ms base, doubling, capped at 500ms
    ///
    /// A configuration choice, not a contract; tune per workload.
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 5,
            base_delay: Duration::from_millis(10),
            multiplier: 2.0,
            max_delay: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    /// Policy with the given budget and base delay, doubling up to 500ms
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        RetryPolicy {
            max_attempts,
            base_delay,
            ..Default::default()
        }
    }

    /// Policy with no backoff delay, for tests and spin-friendly callers
    pub fn no_delay(max_attempts: u32) -> Self {
        RetryPolicy {
            max_attempts,
            base_delay: Duration::ZERO,
            multiplier: 1.0,
            max_delay: Duration::ZERO,
        }
    }

    /// Backoff delay before the given zero-based retry
    pub fn delay_for(&self, retry: u32) -> Duration {
        if self.base_delay.is_zero() {
            return Duration::ZERO;
        }
        // powi saturates to infinity for large exponents; mul_f64 would
        // panic on a non-finite factor, so clamp through max_delay first.
        let factor = self.multiplier.powi(retry.min(63) as i32);
        let raw = self.base_delay.as_secs_f64() * factor;
        let capped = raw.min(self.max_delay.as_secs_f64());
        Duration::from_secs_f64(capped.max(0.0))
    }
}
