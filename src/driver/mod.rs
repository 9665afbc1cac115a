//! Async driver: runs a [`RequestQueue`](crate::RequestQueue) on one tokio task.
//!
//! The queue itself is a synchronous state machine; this module supplies the event loop that
//! awaits its wake-up and serializes access from many callers through a [`QueueHandle`].

mod command;
mod core;
mod error;
mod handle;

pub use command::Snapshot;
pub use self::core::{QueueDriver, SpawnedQueue, StartSignals};
pub use error::SubmitError;
pub use handle::QueueHandle;
