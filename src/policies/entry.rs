//! # Per-request retry state.
//!
//! A [`BackoffEntry`] tracks how often one request has failed and the instant at which it
//! may be attempted again. It keeps its own copy of the [`BackoffPolicy`] it was built with.
//!
//! ## Rules
//! - A failure bumps the count and pushes the release time to `now + delay`.
//! - A success lowers the count but never pulls the release time earlier than it already is,
//!   so a custom release time set by the caller survives.
//! - Release times are [`tokio::time::Instant`]s, so paused test clocks drive them too.
//! - A delay too large to represent as an `Instant` saturates to a far-future release time.

use std::time::Duration;

use tokio::time::Instant;

use crate::policies::BackoffPolicy;

/// Release horizon used when `now + delay` does not fit in an `Instant` (about 30 years).
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// `now + delay`, saturating to `now + FAR_FUTURE` instead of overflowing.
pub(crate) fn release_after(now: Instant, delay: Duration) -> Instant {
    now.checked_add(delay)
        .or_else(|| now.checked_add(FAR_FUTURE))
        .unwrap_or(now)
}

/// Failure count plus release time for a single request.
#[derive(Clone, Debug)]
pub struct BackoffEntry {
    policy: BackoffPolicy,
    failure_count: u32,
    release_time: Instant,
}

impl BackoffEntry {
    /// Creates a fresh entry: no failures, released now (or after `first` when the policy
    /// has [`always_use_initial_delay`](BackoffPolicy::always_use_initial_delay) set).
    pub fn new(policy: BackoffPolicy) -> Self {
        let release_time = release_after(Instant::now(), policy.delay_for_failures(0));
        Self {
            policy,
            failure_count: 0,
            release_time,
        }
    }

    /// Records the outcome of one attempt and recomputes the release time.
    pub fn inform_of_request(&mut self, succeeded: bool) {
        let now = Instant::now();
        if succeeded {
            self.failure_count = self.failure_count.saturating_sub(1);
            let candidate = release_after(now, self.policy.delay_for_failures(self.failure_count));
            self.release_time = self.release_time.max(candidate);
        } else {
            self.failure_count = self.failure_count.saturating_add(1);
            self.release_time =
                release_after(now, self.policy.delay_for_failures(self.failure_count));
        }
    }

    /// Overrides the release time computed by the policy.
    pub fn set_custom_release_time(&mut self, release_time: Instant) {
        self.release_time = release_time;
    }

    /// Forgets all failures; the entry is released immediately.
    pub fn reset(&mut self) {
        self.failure_count = 0;
        self.release_time = Instant::now();
    }

    /// Number of recorded failures.
    #[inline]
    pub fn failure_count(&self) -> u32 {
        self.failure_count
    }

    /// Instant at which the request becomes eligible to start.
    #[inline]
    pub fn release_time(&self) -> Instant {
        self.release_time
    }

    /// Time left until release, zero once released.
    pub fn time_until_release(&self) -> Duration {
        self.release_time.saturating_duration_since(Instant::now())
    }

    /// True while the release time is still in the future.
    pub fn should_reject_request(&self) -> bool {
        self.release_time > Instant::now()
    }

    /// Policy captured at construction.
    #[inline]
    pub fn policy(&self) -> &BackoffPolicy {
        &self.policy
    }
}
