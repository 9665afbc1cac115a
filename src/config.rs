//! # Queue configuration.
//!
//! [`QueueConfig`] centralizes the knobs used when building a
//! [`RequestQueue`](crate::RequestQueue) and its async driver.
//!
//! ## Sentinel values
//! - `bus_capacity = 0` is clamped to 1 by [`QueueConfig::bus_capacity_clamped`].
//! - `command_capacity = 0` is clamped to 1 the same way.

use crate::policies::BackoffPolicy;

/// Configuration for a request queue.
#[derive(Clone, Debug)]
pub struct QueueConfig {
    /// Policy used for requests scheduled from now on.
    pub backoff: BackoffPolicy,

    /// Capacity of the event bus ring buffer.
    ///
    /// Receivers lagging more than this many events skip the oldest ones.
    pub bus_capacity: usize,

    /// Capacity of the driver's command channel.
    ///
    /// When full, `QueueHandle::schedule` waits and `try_schedule` returns `Full`.
    pub command_capacity: usize,
}

impl QueueConfig {
    /// Bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Command channel capacity clamped to a minimum of 1.
    #[inline]
    pub fn command_capacity_clamped(&self) -> usize {
        self.command_capacity.max(1)
    }
}

impl Default for QueueConfig {
    /// - `backoff = BackoffPolicy::default()`
    /// - `bus_capacity = 1024`
    /// - `command_capacity = 1024`
    fn default() -> Self {
        Self {
            backoff: BackoffPolicy::default(),
            bus_capacity: 1024,
            command_capacity: 1024,
        }
    }
}
