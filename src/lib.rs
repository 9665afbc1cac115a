//! # backoff-queue
//!
//! **backoff-queue** serializes a stream of work items so that at most one is in flight at a
//! time, orders pending items by the instant they become eligible, and pushes failed items
//! back with exponentially growing delay.
//!
//! The queue decides *when* the next item may run, never *how*: the caller performs the
//! work and reports back with [`RequestQueue::retry_active`] or
//! [`RequestQueue::release_active`].
//!
//! ## Architecture
//! ```text
//!   caller ── schedule(payload) ──┐
//!                                 ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  RequestQueue<T>                                                  │
//! │  - PendingSet (min-heap by release time)                          │
//! │  - active slot (at most one Request<T>)                           │
//! │  - Wakeup (single deadline, re-armed on every promotion attempt)  │
//! │  - BackoffPolicy (copied into each new BackoffEntry)              │
//! └──────┬─────────────────────────┬──────────────────────────┬───────┘
//!        │ start hook              │ publish(Event)           │ wakeup().await
//!        ▼                         ▼                          ▼
//!   caller reads             Bus (broadcast)            owning task re-runs
//!   active_payload()               │                    try_start_next()
//!   and does the work              ▼
//!                           SubscriberSet ──► LogWriter / custom subscribers
//! ```
//!
//! ### Lifecycle of one request
//! ```text
//! schedule(p) ─► BackoffEntry::new(policy) ─► PendingSet::push
//!     └─► try_start_next()
//!           ├─ active slot busy          ─► Busy (no-op)
//!           ├─ pending empty             ─► Idle
//!           ├─ earliest release > now    ─► Waiting (wake-up armed for that instant)
//!           └─ earliest release <= now   ─► pop ─► active ─► start hook
//!
//! caller works on the active payload, then:
//!     ├─ retry_active(min_delay)  ─► failure_count += 1, release = max(policy, now + min_delay)
//!     │                              back into PendingSet ─► try_start_next()
//!     └─ release_active()         ─► payload returned ─► try_start_next()
//! ```
//!
//! ## Features
//! | Area              | Description                                                    | Key types                                  |
//! |-------------------|----------------------------------------------------------------|--------------------------------------------|
//! | **Queue**         | Single-flight scheduling by release time, retry with backoff.  | [`RequestQueue`], [`PendingSet`], [`Request`] |
//! | **Policies**      | Exponential backoff with jitter, per-request retry state.      | [`BackoffPolicy`], [`JitterPolicy`], [`BackoffEntry`] |
//! | **Events**        | Every state transition as a structured event.                  | [`Event`], [`EventKind`], [`Bus`]          |
//! | **Subscribers**   | Non-blocking fan-out of events.                                | [`Subscribe`], [`SubscriberSet`]           |
//! | **Errors**        | Typed errors for API misuse.                                   | [`QueueError`]                             |
//! | **Configuration** | Centralized settings.                                          | [`QueueConfig`]                            |
//!
//! ## Optional features
//! - `driver` (default): [`QueueDriver`] runs the queue on a tokio task behind a [`QueueHandle`].
//! - `logging`: exports [`LogWriter`], a subscriber emitting `tracing` records.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use backoff_queue::{BackoffPolicy, Promotion, RequestQueue};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let policy = BackoffPolicy {
//!         first: Duration::from_millis(10),
//!         max: Duration::from_millis(100),
//!         factor: 2.0,
//!         ..BackoffPolicy::default()
//!     };
//!     let mut queue = RequestQueue::new(policy);
//!
//!     queue.schedule("refresh");
//!     let mut failures_left = 2;
//!     loop {
//!         if queue.active_payload().is_none() {
//!             queue.wakeup().await;
//!             continue;
//!         }
//!         if failures_left > 0 {
//!             failures_left -= 1;
//!             queue.retry_active(Duration::ZERO)?;
//!         } else {
//!             assert_eq!(queue.active_failure_count()?, 2);
//!             assert_eq!(queue.release_active(), Some("refresh"));
//!             break;
//!         }
//!     }
//!     assert_eq!(queue.try_start_next(), Promotion::Idle);
//!     Ok(())
//! }
//! ```

mod config;
mod error;
mod events;
mod policies;
mod queue;
mod subscribers;

// ---- Public re-exports ----

pub use config::QueueConfig;
pub use error::QueueError;
pub use events::{Bus, Event, EventKind};
pub use policies::{BackoffEntry, BackoffPolicy, JitterPolicy};
pub use queue::{
    PendingSet, Promotion, QueueState, Request, RequestQueue, RequestQueueBuilder, StartHook,
};
pub use subscribers::{Subscribe, SubscriberSet};

// Optional: async driver + handle.
// Enable with: `--features driver` (on by default)
#[cfg(feature = "driver")]
mod driver;
#[cfg(feature = "driver")]
pub use driver::{QueueDriver, QueueHandle, Snapshot, SpawnedQueue, StartSignals, SubmitError};

// Optional: structured logging subscriber.
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
