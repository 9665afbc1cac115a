//! # Backoff policy for queued requests.
//!
//! [`BackoffPolicy`] decides how far into the future a request is pushed after it fails.
//! It is parameterized by:
//! - [`BackoffPolicy::first`] the initial delay;
//! - [`BackoffPolicy::factor`] the multiplicative growth factor;
//! - [`BackoffPolicy::max`] the maximum delay cap;
//! - [`BackoffPolicy::jitter`] randomization on top of the computed delay;
//! - [`BackoffPolicy::ignored_failures`] failures tolerated before any delay kicks in;
//! - [`BackoffPolicy::always_use_initial_delay`] delay even brand-new requests by `first`.
//!
//! The delay for attempt `n` is `first × factor^n`, clamped to `max`, then jittered.
//! The base is derived from the attempt number alone, so jitter never feeds back into
//! later delays.
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use backoff_queue::{BackoffPolicy, JitterPolicy};
//!
//! let backoff = BackoffPolicy {
//!     first: Duration::from_millis(100),
//!     max: Duration::from_secs(10),
//!     factor: 2.0,
//!     ..BackoffPolicy::default()
//! };
//!
//! assert_eq!(backoff.next(0), Duration::from_millis(100));
//! assert_eq!(backoff.next(1), Duration::from_millis(200));
//! assert_eq!(backoff.next(10), Duration::from_secs(10));
//!
//! // No failures yet: released immediately.
//! assert_eq!(backoff.delay_for_failures(0), Duration::ZERO);
//! // First failure waits `first`.
//! assert_eq!(backoff.delay_for_failures(1), Duration::from_millis(100));
//! ```

use std::time::Duration;

use crate::policies::jitter::JitterPolicy;

/// Exponential backoff parameters.
///
/// Every [`BackoffEntry`](crate::BackoffEntry) copies the policy it was created with,
/// so swapping the queue's policy never changes the trajectory of requests already queued.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BackoffPolicy {
    /// Delay after the first counted failure.
    pub first: Duration,
    /// Upper bound for any computed delay.
    pub max: Duration,
    /// Multiplicative growth factor (`>= 1.0` recommended).
    pub factor: f64,
    /// Randomization applied to the clamped delay.
    pub jitter: JitterPolicy,
    /// Number of initial failures that do not cause any delay.
    pub ignored_failures: u32,
    /// When set, a request with zero counted failures still waits `first`,
    /// and every later failure is shifted up by one step.
    pub always_use_initial_delay: bool,
}

impl Default for BackoffPolicy {
    /// - `first = 100ms`
    /// - `max = 30s`
    /// - `factor = 2.0`
    /// - no jitter, no ignored failures, new requests released immediately
    fn default() -> Self {
        Self {
            first: Duration::from_millis(100),
            max: Duration::from_secs(30),
            factor: 2.0,
            jitter: JitterPolicy::None,
            ignored_failures: 0,
            always_use_initial_delay: false,
        }
    }
}

impl BackoffPolicy {
    /// Computes the delay for the given 0-indexed attempt.
    ///
    /// The base is `first × factor^attempt`, clamped to [`BackoffPolicy::max`]; overflow and
    /// non-finite results clamp to `max` as well. Jitter is applied to the clamped base.
    pub fn next(&self, attempt: u32) -> Duration {
        let max_secs = self.max.as_secs_f64();
        let exp = attempt.min(i32::MAX as u32) as i32;
        let unclamped = self.first.as_secs_f64() * self.factor.powi(exp);

        let base = if !unclamped.is_finite() || unclamped < 0.0 || unclamped > max_secs {
            self.max
        } else {
            Duration::try_from_secs_f64(unclamped)
                .map_or(self.max, |d| d.min(self.max))
        };

        match self.jitter {
            JitterPolicy::Decorrelated => {
                self.jitter
                    .apply_decorrelated(self.first.min(self.max), base, self.max)
            }
            _ => self.jitter.apply(base),
        }
    }

    /// Delay until release for a request that has failed `failure_count` times.
    ///
    /// Returns [`Duration::ZERO`] while the effective failure count is zero.
    pub fn delay_for_failures(&self, failure_count: u32) -> Duration {
        let mut effective = failure_count.saturating_sub(self.ignored_failures);
        if self.always_use_initial_delay {
            effective = effective.saturating_add(1);
        }
        match effective {
            0 => Duration::ZERO,
            n => self.next(n - 1),
        }
    }

    /// Returns a copy that delays brand-new requests by `first`.
    pub fn with_initial_delay(mut self) -> Self {
        self.always_use_initial_delay = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exp(first_ms: u64, max: Duration, factor: f64) -> BackoffPolicy {
        BackoffPolicy {
            first: Duration::from_millis(first_ms),
            max,
            factor,
            ..BackoffPolicy::default()
        }
    }

    #[test]
    fn test_exponential_growth_no_jitter() {
        let policy = exp(100, Duration::from_secs(30), 2.0);
        assert_eq!(policy.next(0), Duration::from_millis(100));
        assert_eq!(policy.next(1), Duration::from_millis(200));
        assert_eq!(policy.next(2), Duration::from_millis(400));
        assert_eq!(policy.next(4), Duration::from_millis(1600));
    }

    #[test]
    fn test_constant_factor() {
        let policy = exp(500, Duration::from_secs(30), 1.0);
        for attempt in 0..10 {
            assert_eq!(policy.next(attempt), Duration::from_millis(500));
        }
    }

    #[test]
    fn test_first_exceeds_max() {
        let policy = exp(10_000, Duration::from_secs(5), 2.0);
        assert_eq!(policy.next(0), Duration::from_secs(5));
    }

    #[test]
    fn test_non_finite_overflow_clamps_to_max() {
        let policy = exp(100, Duration::from_secs(10), 2.0);
        assert_eq!(policy.next(u32::MAX), Duration::from_secs(10));
    }

    #[test]
    fn test_unbounded_max_saturates() {
        let policy = exp(1000, Duration::MAX, 2.0);
        assert_eq!(policy.next(10), Duration::from_secs(1024));
        assert_eq!(policy.next(64), Duration::MAX);
        assert_eq!(policy.next(500), Duration::MAX);
        assert_eq!(policy.delay_for_failures(u32::MAX), Duration::MAX);
    }

    #[test]
    fn test_equal_jitter_bounds() {
        let policy = BackoffPolicy {
            jitter: JitterPolicy::Equal,
            ..exp(1000, Duration::from_secs(30), 1.0)
        };
        for attempt in 0..50 {
            let delay = policy.next(attempt);
            assert!(delay >= Duration::from_millis(500));
            assert!(delay <= Duration::from_millis(1000));
        }
    }

    #[test]
    fn test_delay_for_failures() {
        let policy = exp(1000, Duration::from_secs(60), 2.0);
        assert_eq!(policy.delay_for_failures(0), Duration::ZERO);
        assert_eq!(policy.delay_for_failures(1), Duration::from_secs(1));
        assert_eq!(policy.delay_for_failures(2), Duration::from_secs(2));
        assert_eq!(policy.delay_for_failures(3), Duration::from_secs(4));
    }

    #[test]
    fn test_ignored_failures() {
        let policy = BackoffPolicy {
            ignored_failures: 2,
            ..exp(1000, Duration::from_secs(60), 2.0)
        };
        assert_eq!(policy.delay_for_failures(1), Duration::ZERO);
        assert_eq!(policy.delay_for_failures(2), Duration::ZERO);
        assert_eq!(policy.delay_for_failures(3), Duration::from_secs(1));
    }

    #[test]
    fn test_always_use_initial_delay_shifts_by_one() {
        let policy = exp(1000, Duration::from_secs(60), 2.0).with_initial_delay();
        assert_eq!(policy.delay_for_failures(0), Duration::from_secs(1));
        assert_eq!(policy.delay_for_failures(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for_failures(2), Duration::from_secs(4));
    }
}
