//! # Events emitted by the request queue.
//!
//! [`EventKind`] classifies what happened; [`Event`] carries the metadata.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore order when subscribers observe events out of order.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use backoff_queue::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::BackoffScheduled)
//!     .with_failure_count(2)
//!     .with_delay(Duration::from_secs(4))
//!     .with_pending(3);
//!
//! assert_eq!(ev.kind, EventKind::BackoffScheduled);
//! assert_eq!(ev.delay_ms, Some(4000));
//! assert_eq!(ev.pending, Some(3));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of queue events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Queue lifecycle ===
    /// A new payload entered the pending set.
    ///
    /// Sets:
    /// - `delay_ms`: time until the new request is released
    /// - `pending`: pending set size after insertion
    RequestScheduled,

    /// A pending request was promoted to active.
    ///
    /// Sets:
    /// - `failure_count`: failures recorded so far for this request
    /// - `pending`: pending set size after the pop
    RequestStarted,

    /// The earliest pending request is not due yet; a wake-up was (re)armed.
    ///
    /// Sets:
    /// - `delay_ms`: time until the wake-up fires
    /// - `pending`: pending set size
    WakeupArmed,

    /// The active request failed and went back to the pending set.
    ///
    /// Sets:
    /// - `failure_count`: failures after this one
    /// - `delay_ms`: time until it is released again
    /// - `reason`: `"floor"` when the caller's minimum delay overrode the policy
    /// - `pending`: pending set size after re-insertion
    BackoffScheduled,

    /// The active request was handed back to the caller.
    ///
    /// Sets:
    /// - `failure_count`: failures it accumulated
    /// - `pending`: pending set size
    RequestReleased,

    /// Pending requests were removed by the caller.
    ///
    /// Sets:
    /// - `reason`: number of removed requests
    /// - `pending`: pending set size after removal
    PendingRemoved,

    /// The backoff policy for future requests was replaced.
    PolicyChanged,

    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `reason`: subscriber name and panic message
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `reason`: subscriber name and cause
    SubscriberOverflow,
}

/// Queue event with optional metadata.
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Failure count of the request concerned.
    pub failure_count: Option<u32>,
    /// Delay in milliseconds (compact).
    pub delay_ms: Option<u32>,
    /// Pending set size at emission time.
    pub pending: Option<usize>,
    /// Human-readable detail.
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            failure_count: None,
            delay_ms: None,
            pending: None,
            reason: None,
        }
    }

    #[inline]
    pub fn with_failure_count(mut self, n: u32) -> Self {
        self.failure_count = Some(n);
        self
    }

    /// Attaches a delay (stored as milliseconds, saturating at `u32::MAX`).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        self.delay_ms = Some(d.as_millis().min(u128::from(u32::MAX)) as u32);
        self
    }

    #[inline]
    pub fn with_pending(mut self, n: usize) -> Self {
        self.pending = Some(n);
        self
    }

    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Creates a subscriber overflow event.
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_reason(format!("subscriber={subscriber} panic={info}"))
    }

    #[inline]
    pub fn is_subscriber_overflow(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberOverflow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seq_is_monotonic() {
        let a = Event::new(EventKind::RequestScheduled);
        let b = Event::new(EventKind::RequestStarted);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn delay_saturates() {
        let ev = Event::new(EventKind::WakeupArmed).with_delay(Duration::from_secs(u64::MAX / 2));
        assert_eq!(ev.delay_ms, Some(u32::MAX));
    }
}
