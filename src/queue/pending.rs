//! # Pending set: requests ordered by release time.
//!
//! [`PendingSet`] is a min-heap over [`Request::release_time`]. The release time is the
//! **only** ordering key; payloads are never compared, so requests with equal release times
//! come out in an unspecified order (not FIFO).
//!
//! ## Complexity
//! - `push` / `pop` / `pop_due`: O(log n)
//! - `peek_release_time` / `len`: O(1)
//! - `remove_where`: O(n)

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::collections::binary_heap::PeekMut;

use tokio::time::Instant;

use super::request::Request;

/// Heap slot ordered by release time, reversed so `BinaryHeap` pops the earliest first.
struct Queued<T>(Request<T>);

impl<T> PartialEq for Queued<T> {
    fn eq(&self, other: &Self) -> bool {
        self.0.release_time() == other.0.release_time()
    }
}

impl<T> Eq for Queued<T> {}

impl<T> Ord for Queued<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        other.0.release_time().cmp(&self.0.release_time())
    }
}

impl<T> PartialOrd for Queued<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Result of [`PendingSet::pop_due`].
pub(crate) enum Due<T> {
    /// The earliest request was due and has been removed.
    Ready(Request<T>),
    /// The earliest request is released at the given instant, still in the future.
    NotYet(Instant),
    /// Nothing pending.
    Empty,
}

/// Time-ordered container of pending requests.
pub struct PendingSet<T> {
    heap: BinaryHeap<Queued<T>>,
}

impl<T> Default for PendingSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> PendingSet<T> {
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
        }
    }

    /// Inserts a request.
    pub fn push(&mut self, request: Request<T>) {
        self.heap.push(Queued(request));
    }

    /// Smallest release time among pending requests.
    pub fn peek_release_time(&self) -> Option<Instant> {
        self.heap.peek().map(|q| q.0.release_time())
    }

    /// Removes and returns the request with the smallest release time.
    pub fn pop(&mut self) -> Option<Request<T>> {
        self.heap.pop().map(|q| q.0)
    }

    /// Pops the earliest request only if it is released at or before `now`.
    pub(crate) fn pop_due(&mut self, now: Instant) -> Due<T> {
        let Some(top) = self.heap.peek_mut() else {
            return Due::Empty;
        };
        let release = top.0.release_time();
        if release > now {
            return Due::NotYet(release);
        }
        Due::Ready(PeekMut::pop(top).0)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Iterates over pending requests in unspecified (heap) order.
    ///
    /// Non-destructive; every call starts a fresh pass.
    pub fn iter(&self) -> impl Iterator<Item = &Request<T>> + '_ {
        self.heap.iter().map(|q| &q.0)
    }

    /// Removes every request whose payload matches `pred` and returns them.
    pub fn remove_where<F>(&mut self, mut pred: F) -> Vec<Request<T>>
    where
        F: FnMut(&T) -> bool,
    {
        let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.heap)
            .into_vec()
            .into_iter()
            .partition(|q| pred(q.0.payload()));
        self.heap = BinaryHeap::from(kept);
        removed.into_iter().map(|q| q.0).collect()
    }

    /// Removes every pending request, in unspecified order.
    pub fn drain(&mut self) -> impl Iterator<Item = Request<T>> + '_ {
        self.heap.drain().map(|q| q.0)
    }
}
