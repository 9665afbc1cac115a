//! # Deferred wake-up for the queue.
//!
//! At most one wake-up exists per queue. Arming it again replaces the previous deadline,
//! which is how the old wake-up gets cancelled. The deadline is only turned into a
//! [`tokio::time::Sleep`] while somebody awaits [`Wakeup::fired`], so arming works from
//! plain synchronous code and outside of a runtime.

use tokio::time::{self, Instant};

#[derive(Debug, Default)]
pub(crate) struct Wakeup {
    deadline: Option<Instant>,
}

impl Wakeup {
    /// Arms (or re-arms) the wake-up. Returns `true` if the deadline changed.
    pub(crate) fn arm(&mut self, deadline: Instant) -> bool {
        let changed = self.deadline != Some(deadline);
        self.deadline = Some(deadline);
        changed
    }

    pub(crate) fn disarm(&mut self) {
        self.deadline = None;
    }

    pub(crate) fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Completes once the armed deadline passes, then disarms.
    ///
    /// Never completes while disarmed. Cancel-safe: dropping the future leaves the
    /// deadline armed.
    pub(crate) async fn fired(&mut self) {
        match self.deadline {
            Some(deadline) => {
                time::sleep_until(deadline).await;
                self.deadline = None;
            }
            None => std::future::pending::<()>().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn rearm_replaces_deadline() {
        let mut w = Wakeup::default();
        let now = Instant::now();
        assert!(w.arm(now + Duration::from_secs(5)));
        assert!(!w.arm(now + Duration::from_secs(5)));
        assert!(w.arm(now + Duration::from_secs(1)));

        w.fired().await;
        assert_eq!(Instant::now(), now + Duration::from_secs(1));
        assert!(w.deadline().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn disarmed_never_fires() {
        let mut w = Wakeup::default();
        w.arm(Instant::now() + Duration::from_millis(10));
        w.disarm();
        let res = time::timeout(Duration::from_secs(60), w.fired()).await;
        assert!(res.is_err());
    }
}
