//! Error types used by the request queue.
//!
//! [`QueueError`] covers misuse of the queue API: operations that need an active request
//! or a non-empty pending set. They are programming errors on the caller's side and are
//! reported instead of being silently ignored.

use thiserror::Error;

/// # Errors produced by [`RequestQueue`](crate::RequestQueue) operations.
#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueError {
    /// The operation needs an active request but the slot is empty.
    #[error("no active request")]
    NoActiveRequest,

    /// The operation needs at least one pending request.
    #[error("pending set is empty")]
    Empty,
}

impl QueueError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use backoff_queue::QueueError;
    ///
    /// assert_eq!(QueueError::NoActiveRequest.as_label(), "queue_no_active_request");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            QueueError::NoActiveRequest => "queue_no_active_request",
            QueueError::Empty => "queue_empty",
        }
    }
}
