//! # Logging subscriber.
//!
//! [`LogWriter`] turns queue events into structured `tracing` records. Install any
//! `tracing` subscriber (e.g. `tracing_subscriber::fmt`) to see them.
//!
//! ## Output (fmt layer)
//! ```text
//! DEBUG request scheduled seq=0 delay_ms=0 pending=1
//! INFO  request started seq=1 failures=0 pending=0
//! WARN  backoff scheduled seq=2 failures=1 delay_ms=2000 reason=floor
//! DEBUG wakeup armed seq=3 delay_ms=2000 pending=1
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Structured logging subscriber (feature `logging`).
#[derive(Debug, Default, Clone, Copy)]
pub struct LogWriter;

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let reason = e.reason.as_deref().unwrap_or("");
        match e.kind {
            EventKind::RequestScheduled => {
                tracing::debug!(
                    seq = e.seq,
                    delay_ms = ?e.delay_ms,
                    pending = ?e.pending,
                    "request scheduled"
                );
            }
            EventKind::RequestStarted => {
                tracing::info!(
                    seq = e.seq,
                    failures = ?e.failure_count,
                    pending = ?e.pending,
                    "request started"
                );
            }
            EventKind::WakeupArmed => {
                tracing::debug!(
                    seq = e.seq,
                    delay_ms = ?e.delay_ms,
                    pending = ?e.pending,
                    "wakeup armed"
                );
            }
            EventKind::BackoffScheduled => {
                tracing::warn!(
                    seq = e.seq,
                    failures = ?e.failure_count,
                    delay_ms = ?e.delay_ms,
                    reason,
                    "backoff scheduled"
                );
            }
            EventKind::RequestReleased => {
                tracing::info!(
                    seq = e.seq,
                    failures = ?e.failure_count,
                    pending = ?e.pending,
                    "request released"
                );
            }
            EventKind::PendingRemoved => {
                tracing::info!(
                    seq = e.seq,
                    removed = reason,
                    pending = ?e.pending,
                    "pending requests removed"
                );
            }
            EventKind::PolicyChanged => {
                tracing::info!(seq = e.seq, "backoff policy changed");
            }
            EventKind::SubscriberPanicked | EventKind::SubscriberOverflow => {
                tracing::warn!(seq = e.seq, kind = ?e.kind, reason, "subscriber problem");
            }
        }
    }

    fn name(&self) -> &'static str {
        "log_writer"
    }
}
