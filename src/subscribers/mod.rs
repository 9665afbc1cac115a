//! # Event subscribers.
//!
//! ```text
//! RequestQueue ── publish(Event) ──► Bus ──► listener ──► SubscriberSet::emit(&Event)
//!                                                            ├──► LogWriter   (feature `logging`)
//!                                                            └──► custom Subscribe impls
//! ```
//!
//! ## Implementing a subscriber
//! ```rust
//! use backoff_queue::{Event, EventKind, Subscribe};
//! use async_trait::async_trait;
//!
//! struct RetryCounter;
//!
//! #[async_trait]
//! impl Subscribe for RetryCounter {
//!     async fn on_event(&self, event: &Event) {
//!         if event.kind == EventKind::BackoffScheduled {
//!             // bump a metric
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str { "retry_counter" }
//! }
//! ```

#[cfg(feature = "logging")]
mod log;
mod set;
mod subscribe;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
