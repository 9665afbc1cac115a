use tokio::time::Instant;

use crate::policies::BackoffEntry;

/// One payload together with its retry state.
///
/// A `Request` is owned by exactly one place at a time: the pending set, the active slot,
/// or (after [`RequestQueue::release_active`](crate::RequestQueue::release_active)) the caller.
#[derive(Debug)]
pub struct Request<T> {
    payload: T,
    backoff: BackoffEntry,
}

impl<T> Request<T> {
    pub(crate) fn new(payload: T, backoff: BackoffEntry) -> Self {
        Self { payload, backoff }
    }

    /// Caller-supplied payload; never inspected by the queue.
    pub fn payload(&self) -> &T {
        &self.payload
    }

    /// Mutable payload access.
    pub fn payload_mut(&mut self) -> &mut T {
        &mut self.payload
    }

    /// Retry state: failure count, release time and the captured policy.
    pub fn backoff(&self) -> &BackoffEntry {
        &self.backoff
    }

    pub(crate) fn backoff_mut(&mut self) -> &mut BackoffEntry {
        &mut self.backoff
    }

    /// Shorthand for `self.backoff().release_time()`.
    #[inline]
    pub fn release_time(&self) -> Instant {
        self.backoff.release_time()
    }

    /// Shorthand for `self.backoff().failure_count()`.
    #[inline]
    pub fn failure_count(&self) -> u32 {
        self.backoff.failure_count()
    }

    /// Drops the retry state and returns the payload.
    pub fn into_payload(self) -> T {
        self.payload
    }

    /// Splits the request, e.g. to re-queue the payload elsewhere with its history.
    pub fn into_parts(self) -> (T, BackoffEntry) {
        (self.payload, self.backoff)
    }
}
