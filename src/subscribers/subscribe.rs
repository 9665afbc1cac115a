//! # Core subscriber trait
//!
//! `Subscribe` is the extension point for plugging custom event handlers into a queue's
//! event stream. Each subscriber is driven by a dedicated worker fed by a bounded queue
//! owned by the [`SubscriberSet`](crate::SubscriberSet).
//!
//! ## Contract
//! - Implementations may be slow (I/O, batching); they never block the queue nor other
//!   subscribers.
//! - Each subscriber declares its queue capacity via [`Subscribe::queue_capacity`]. On
//!   overflow, events for that subscriber are **dropped** and reported.

use async_trait::async_trait;

use crate::events::Event;

/// Contract for event subscribers.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handles a single event.
    async fn on_event(&self, event: &Event);

    /// Human-readable name (for logs).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Preferred capacity of this subscriber's queue.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
