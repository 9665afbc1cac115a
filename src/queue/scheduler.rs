//! # RequestQueue: single-flight scheduling with backoff.
//!
//! [`RequestQueue`] owns a [`PendingSet`] and one active slot. It promotes the earliest
//! released request when the slot is free and arms a wake-up when the earliest request is
//! still in the future.
//!
//! ## State machine
//! ```text
//!            schedule / retry / release
//!   ┌──────┐ ───────────────────────────► try_start_next()
//!   │ Idle │                                   │
//!   └──────┘ ◄── pending empty ────────────────┤
//!   ┌─────────┐                                │
//!   │ Waiting │ ◄── earliest release > now ────┤ (wake-up armed for that instant)
//!   └─────────┘                                │
//!        │ wakeup() fires ─► try_start_next()  │
//!   ┌────────┐                                 │
//!   │ Active │ ◄── earliest release <= now ────┘ (pop, start hook fires)
//!   └────────┘
//!        ├─► retry_active(min)  ─► back to pending, try_start_next()
//!        └─► release_active()   ─► payload to caller, try_start_next()
//! ```
//!
//! ## Rules
//! - At most one request is active; it is never also pending.
//! - A wake-up is armed iff nothing is active, the set is non-empty, and the earliest
//!   release time is in the future.
//! - The start hook runs synchronously inside `try_start_next`, exactly once per promotion.
//! - Operations never block; awaiting the wake-up is the owner's job (see
//!   [`RequestQueue::wakeup`]).
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use backoff_queue::{BackoffPolicy, Promotion, RequestQueue};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), backoff_queue::QueueError> {
//! let mut queue = RequestQueue::new(BackoffPolicy::default());
//!
//! assert_eq!(queue.schedule("fetch a"), Promotion::Started);
//! queue.schedule("fetch b");
//! assert_eq!(queue.active_payload(), Some(&"fetch a"));
//! assert_eq!(queue.len(), 1);
//!
//! // "fetch a" failed upstream: push it back for at least a second.
//! queue.retry_active(Duration::from_secs(1))?;
//! assert_eq!(queue.active_payload(), Some(&"fetch b"));
//!
//! assert_eq!(queue.release_active(), Some("fetch b"));
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use tokio::time::Instant;

use crate::{
    error::QueueError,
    events::{Bus, Event, EventKind},
    policies::{BackoffEntry, BackoffPolicy, release_after},
};

use super::{
    pending::{Due, PendingSet},
    request::Request,
    wakeup::Wakeup,
};

/// Hook invoked synchronously when a request becomes active.
pub type StartHook = Box<dyn FnMut() + Send>;

/// Outcome of a promotion attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Promotion {
    /// A request is already active; nothing changed.
    Busy,
    /// Nothing pending.
    Idle,
    /// The earliest request is released later; the wake-up is armed for `until`.
    Waiting {
        /// Deadline of the armed wake-up.
        until: Instant,
    },
    /// A pending request was promoted and the start hook ran.
    Started,
}

/// Observable state of a queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueState {
    /// Nothing active, no wake-up armed.
    Idle,
    /// Nothing active, wake-up armed for the earliest release time.
    Waiting {
        /// Deadline of the armed wake-up.
        until: Instant,
    },
    /// One request in flight.
    Active,
}

/// Single-flight request queue ordered by release time.
///
/// Generic over the payload `T`; the queue never inspects payloads.
pub struct RequestQueue<T> {
    policy: BackoffPolicy,
    pending: PendingSet<T>,
    active: Option<Request<T>>,
    wakeup: Wakeup,
    on_start: Option<StartHook>,
    bus: Option<Bus>,
}

impl<T> RequestQueue<T> {
    /// Creates a queue without start hook or event bus.
    pub fn new(policy: BackoffPolicy) -> Self {
        Self::builder(policy).build()
    }

    /// Returns a builder for a queue using `policy` for new requests.
    pub fn builder(policy: BackoffPolicy) -> RequestQueueBuilder<T> {
        RequestQueueBuilder::new(policy)
    }

    /// Schedules a new payload with a fresh backoff entry, then tries to start it.
    pub fn schedule(&mut self, payload: T) -> Promotion {
        let request = Request::new(payload, BackoffEntry::new(self.policy));
        let delay = request.backoff().time_until_release();
        self.pending.push(request);

        let pending = self.pending.len();
        self.publish(|| {
            Event::new(EventKind::RequestScheduled)
                .with_delay(delay)
                .with_pending(pending)
        });
        self.try_start_next()
    }

    /// Promotes the earliest released request if the active slot is free.
    ///
    /// Called internally after every change that could unblock progress; calling it again
    /// while a request is active is a no-op.
    pub fn try_start_next(&mut self) -> Promotion {
        if self.active.is_some() {
            return Promotion::Busy;
        }

        let now = Instant::now();
        match self.pending.pop_due(now) {
            Due::Empty => {
                self.wakeup.disarm();
                Promotion::Idle
            }
            Due::NotYet(until) => {
                if self.wakeup.arm(until) {
                    let pending = self.pending.len();
                    self.publish(|| {
                        Event::new(EventKind::WakeupArmed)
                            .with_delay(until - now)
                            .with_pending(pending)
                    });
                }
                Promotion::Waiting { until }
            }
            Due::Ready(request) => {
                self.wakeup.disarm();
                let failures = request.failure_count();
                self.active = Some(request);

                let pending = self.pending.len();
                self.publish(|| {
                    Event::new(EventKind::RequestStarted)
                        .with_failure_count(failures)
                        .with_pending(pending)
                });
                if let Some(hook) = self.on_start.as_mut() {
                    hook();
                }
                Promotion::Started
            }
        }
    }

    /// Records a failure of the active request and puts it back into the pending set.
    ///
    /// The release time is at least `now + min_backoff_delay`, whatever the policy says.
    /// Floors too large for an `Instant` park the request about 30 years out.
    pub fn retry_active(&mut self, min_backoff_delay: Duration) -> Result<Promotion, QueueError> {
        let mut request = self.active.take().ok_or(QueueError::NoActiveRequest)?;

        let backoff = request.backoff_mut();
        backoff.inform_of_request(false);
        let floored = backoff.time_until_release() < min_backoff_delay;
        if floored {
            backoff.set_custom_release_time(release_after(Instant::now(), min_backoff_delay));
        }
        let failures = backoff.failure_count();
        let delay = backoff.time_until_release();
        self.pending.push(request);

        let pending = self.pending.len();
        self.publish(|| {
            let ev = Event::new(EventKind::BackoffScheduled)
                .with_failure_count(failures)
                .with_delay(delay)
                .with_pending(pending);
            if floored { ev.with_reason("floor") } else { ev }
        });
        Ok(self.try_start_next())
    }

    /// Hands the active payload back to the caller and tries to start the next one.
    ///
    /// Returns `None` (and changes nothing) when no request is active.
    pub fn release_active(&mut self) -> Option<T> {
        let request = self.active.take()?;
        let failures = request.failure_count();

        let pending = self.pending.len();
        self.publish(|| {
            Event::new(EventKind::RequestReleased)
                .with_failure_count(failures)
                .with_pending(pending)
        });
        let payload = request.into_payload();
        self.try_start_next();
        Some(payload)
    }

    /// Resolves when the armed wake-up fires, then runs [`try_start_next`](Self::try_start_next).
    ///
    /// Stays pending while no wake-up is armed. Cancel-safe, so it can sit in a
    /// `tokio::select!` loop next to other event sources of the owning task.
    pub async fn wakeup(&mut self) -> Promotion {
        self.wakeup.fired().await;
        self.try_start_next()
    }

    /// Deadline of the armed wake-up, if any.
    pub fn wakeup_deadline(&self) -> Option<Instant> {
        self.wakeup.deadline()
    }

    /// Payload of the request in flight.
    pub fn active_payload(&self) -> Option<&T> {
        self.active.as_ref().map(Request::payload)
    }

    /// Mutable access to the in-flight payload, e.g. to record progress before a retry.
    pub fn active_payload_mut(&mut self) -> Option<&mut T> {
        self.active.as_mut().map(Request::payload_mut)
    }

    /// The in-flight request together with its backoff state.
    pub fn active_request(&self) -> Option<&Request<T>> {
        self.active.as_ref()
    }

    /// Failures recorded for the active request.
    pub fn active_failure_count(&self) -> Result<u32, QueueError> {
        self.active
            .as_ref()
            .map(Request::failure_count)
            .ok_or(QueueError::NoActiveRequest)
    }

    /// Replaces the policy used for requests scheduled from now on.
    ///
    /// Requests already pending or active keep the policy they were created with.
    pub fn set_backoff_policy(&mut self, policy: BackoffPolicy) {
        self.policy = policy;
        self.publish(|| Event::new(EventKind::PolicyChanged));
    }

    /// Policy that the next `schedule` will copy.
    pub fn backoff_policy(&self) -> &BackoffPolicy {
        &self.policy
    }

    /// True when no request is pending (the active one is not counted).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Number of pending requests (the active one is not counted).
    #[inline]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Earliest release time among pending requests.
    pub fn next_release_time(&self) -> Result<Instant, QueueError> {
        self.pending.peek_release_time().ok_or(QueueError::Empty)
    }

    /// Iterates over pending requests in unspecified order.
    pub fn iter_pending(&self) -> impl Iterator<Item = &Request<T>> + '_ {
        self.pending.iter()
    }

    /// Removes pending requests whose payload matches `pred` and returns their payloads.
    ///
    /// The active request is never touched; use [`release_active`](Self::release_active).
    pub fn remove_pending<F>(&mut self, pred: F) -> Vec<T>
    where
        F: FnMut(&T) -> bool,
    {
        let removed: Vec<T> = self
            .pending
            .remove_where(pred)
            .into_iter()
            .map(Request::into_payload)
            .collect();

        if !removed.is_empty() {
            let count = removed.len();
            let pending = self.pending.len();
            self.publish(|| {
                Event::new(EventKind::PendingRemoved)
                    .with_reason(count.to_string())
                    .with_pending(pending)
            });
            self.try_start_next();
        }
        removed
    }

    /// Removes every pending request and returns the payloads in unspecified order.
    pub fn clear_pending(&mut self) -> Vec<T> {
        self.remove_pending(|_| true)
    }

    /// Current state-machine state.
    pub fn state(&self) -> QueueState {
        if self.active.is_some() {
            return QueueState::Active;
        }
        match self.wakeup.deadline() {
            Some(until) => QueueState::Waiting { until },
            None => QueueState::Idle,
        }
    }

    fn publish(&self, make: impl FnOnce() -> Event) {
        if let Some(bus) = &self.bus {
            bus.publish(make());
        }
    }
}

/// Builder for [`RequestQueue`].
pub struct RequestQueueBuilder<T> {
    policy: BackoffPolicy,
    on_start: Option<StartHook>,
    bus: Option<Bus>,
    _payload: std::marker::PhantomData<fn() -> T>,
}

impl<T> RequestQueueBuilder<T> {
    /// Starts a builder with no start hook and no bus.
    pub fn new(policy: BackoffPolicy) -> Self {
        Self {
            policy,
            on_start: None,
            bus: None,
            _payload: std::marker::PhantomData,
        }
    }

    /// Sets the hook invoked each time a request becomes active.
    ///
    /// The hook runs while the queue is mutably borrowed, so it cannot call back into the
    /// queue; signal another part of the program instead (flag, channel, notify).
    pub fn on_start<F>(mut self, hook: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        self.on_start = Some(Box::new(hook));
        self
    }

    /// Publishes every state transition on `bus`.
    pub fn with_bus(mut self, bus: Bus) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Builds an idle queue.
    pub fn build(self) -> RequestQueue<T> {
        RequestQueue {
            policy: self.policy,
            pending: PendingSet::new(),
            active: None,
            wakeup: Wakeup::default(),
            on_start: self.on_start,
            bus: self.bus,
        }
    }
}
