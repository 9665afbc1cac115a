//! Single-flight request queue.
//!
//! - `request`: payload + [`BackoffEntry`](crate::BackoffEntry) pairing;
//! - `pending`: min-heap of requests keyed by release time;
//! - `wakeup`: the single deferred wake-up of a queue;
//! - `scheduler`: [`RequestQueue`], the promotion/retry state machine.

mod pending;
mod request;
mod scheduler;
mod wakeup;

pub use pending::PendingSet;
pub use request::Request;
pub use scheduler::{Promotion, QueueState, RequestQueue, RequestQueueBuilder, StartHook};
