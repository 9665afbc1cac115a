use thiserror::Error;

use crate::error::QueueError;

/// Error returned by [`QueueHandle`](crate::QueueHandle) operations.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitError {
    /// Command channel is full (try again later or use the async variant).
    #[error("command queue full")]
    Full,

    /// Driver task is gone (cancelled or panicked).
    #[error("driver channel closed")]
    Closed,

    /// The queue rejected the command.
    #[error(transparent)]
    Rejected(#[from] QueueError),
}

impl SubmitError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            SubmitError::Full => "submit_full",
            SubmitError::Closed => "submit_closed",
            SubmitError::Rejected(e) => e.as_label(),
        }
    }
}
