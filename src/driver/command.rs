use std::time::Duration;

use tokio::sync::oneshot;
use tokio::time::Instant;

use crate::{error::QueueError, policies::BackoffPolicy, queue::QueueState};

/// Boxed payload predicate used by `remove_pending`.
pub(super) type Predicate<T> = Box<dyn FnMut(&T) -> bool + Send>;

/// Commands accepted by the driver loop.
pub(super) enum Command<T> {
    Schedule(T),
    Retry {
        min_delay: Duration,
        reply: oneshot::Sender<Result<(), QueueError>>,
    },
    Release {
        reply: oneshot::Sender<Option<T>>,
    },
    SetPolicy(BackoffPolicy),
    RemovePending {
        pred: Predicate<T>,
        reply: oneshot::Sender<Vec<T>>,
    },
    Snapshot {
        reply: oneshot::Sender<Snapshot<T>>,
    },
}

/// Point-in-time view of a driven queue.
#[derive(Clone, Debug)]
pub struct Snapshot<T> {
    /// Clone of the active payload.
    pub active: Option<T>,
    /// Failures recorded for the active request.
    pub active_failure_count: Option<u32>,
    /// Number of pending requests.
    pub pending: usize,
    /// Earliest pending release time.
    pub next_release: Option<Instant>,
    /// State-machine state.
    pub state: QueueState,
}
