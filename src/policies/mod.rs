//! Backoff policies and per-request retry state.
//!
//! ## Contents
//! - [`BackoffPolicy`] how retry delays evolve (first / factor / max + jitter)
//! - [`JitterPolicy`]  randomization strategy to avoid thundering herd
//! - [`BackoffEntry`]  failure count and release time of one request
//!
//! ## Quick wiring
//! ```text
//! RequestQueue::schedule(payload)
//!      └─► BackoffEntry::new(current policy)      (entry keeps a copy of the policy)
//! RequestQueue::retry_active(min_delay)
//!      └─► entry.inform_of_request(false)          (policy.delay_for_failures(n))
//!      └─► entry.set_custom_release_time(..)       (only when below min_delay)
//! ```

mod backoff;
mod entry;
mod jitter;

pub use backoff::BackoffPolicy;
pub use entry::BackoffEntry;
pub(crate) use entry::release_after;
pub use jitter::JitterPolicy;
