//! # Jitter on release times.
//!
//! Several queues that back off from the same failing upstream would otherwise schedule their
//! retries for the same instants. [`JitterPolicy`] spreads the release time of a retried
//! request around the delay computed by [`BackoffPolicy`](crate::BackoffPolicy).
//!
//! | Variant        | Release after                          |
//! |----------------|----------------------------------------|
//! | `None`         | exactly `delay`                        |
//! | `Full`         | uniform in `[0, delay]`                |
//! | `Equal`        | `delay/2 + uniform[0, delay/2]`        |
//! | `Decorrelated` | uniform in `[base, prev * 3]`, ≤ `max` |
//!
//! Randomized variants work in whole milliseconds. Delays beyond `u64::MAX` milliseconds
//! saturate instead of wrapping.

use std::time::Duration;

use rand::Rng;

/// Randomization applied on top of the computed backoff delay.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum JitterPolicy {
    /// Release exactly when the policy says. The right choice for tests.
    #[default]
    None,

    /// Anywhere between now and the computed release time.
    ///
    /// A retried request may come back almost immediately.
    Full,

    /// At least half of the computed delay is kept.
    Equal,

    /// Widens with the previous delay; needs the context passed to
    /// [`apply_decorrelated`](Self::apply_decorrelated).
    Decorrelated,
}

impl JitterPolicy {
    /// Applies jitter to `delay`.
    ///
    /// `Decorrelated` returns `delay` unchanged here.
    pub fn apply(&self, delay: Duration) -> Duration {
        match self {
            JitterPolicy::None | JitterPolicy::Decorrelated => delay,
            JitterPolicy::Full => full(delay),
            JitterPolicy::Equal => equal(delay),
        }
    }

    /// Applies decorrelated jitter given the floor, the un-jittered delay and the cap.
    ///
    /// Falls back to [`apply`](Self::apply) for every other variant.
    pub fn apply_decorrelated(&self, base: Duration, prev: Duration, max: Duration) -> Duration {
        if !matches!(self, JitterPolicy::Decorrelated) {
            return self.apply(prev);
        }

        let base_ms = millis(base);
        let upper = millis(prev).saturating_mul(3).min(millis(max)).max(base_ms);
        if base_ms >= upper {
            return base;
        }
        Duration::from_millis(rand::rng().random_range(base_ms..=upper))
    }
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

fn full(delay: Duration) -> Duration {
    let ms = millis(delay);
    if ms == 0 {
        return Duration::ZERO;
    }
    Duration::from_millis(rand::rng().random_range(0..=ms))
}

fn equal(delay: Duration) -> Duration {
    let half = millis(delay) / 2;
    if half == 0 {
        return delay;
    }
    Duration::from_millis(half + rand::rng().random_range(0..=half))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_is_identity() {
        let d = Duration::from_millis(1234);
        assert_eq!(JitterPolicy::None.apply(d), d);
        assert_eq!(JitterPolicy::default(), JitterPolicy::None);
    }

    #[test]
    fn full_stays_within_delay() {
        let delay = Duration::from_millis(500);
        for _ in 0..200 {
            assert!(JitterPolicy::Full.apply(delay) <= delay);
        }
        assert_eq!(JitterPolicy::Full.apply(Duration::ZERO), Duration::ZERO);
    }

    #[test]
    fn equal_keeps_at_least_half() {
        for _ in 0..200 {
            let d = JitterPolicy::Equal.apply(Duration::from_millis(800));
            assert!(d >= Duration::from_millis(400));
            assert!(d <= Duration::from_millis(800));
        }
    }

    #[test]
    fn huge_delays_saturate_instead_of_wrapping() {
        let floor = Duration::from_millis(u64::MAX / 2);
        for _ in 0..50 {
            assert!(JitterPolicy::Equal.apply(Duration::MAX) >= floor);
        }

        let base = Duration::from_secs(1);
        let d = JitterPolicy::Decorrelated.apply_decorrelated(base, Duration::MAX, Duration::MAX);
        assert!(d >= base);
    }

    #[test]
    fn decorrelated_bounds() {
        let base = Duration::from_millis(100);
        let max = Duration::from_secs(2);
        let jitter = JitterPolicy::Decorrelated;
        for _ in 0..200 {
            let d = jitter.apply_decorrelated(base, Duration::from_millis(400), max);
            assert!(d >= base);
            assert!(d <= Duration::from_millis(1200));
        }
        // prev * 3 beyond the cap
        for _ in 0..200 {
            assert!(jitter.apply_decorrelated(base, Duration::from_secs(5), max) <= max);
        }
    }

    #[test]
    fn decorrelated_collapses_to_base() {
        let base = Duration::from_millis(300);
        let d = JitterPolicy::Decorrelated.apply_decorrelated(
            base,
            Duration::from_millis(50),
            Duration::from_millis(100),
        );
        assert_eq!(d, base);
    }
}
