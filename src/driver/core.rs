use std::sync::Arc;

use anyhow::anyhow;
use tokio::{
    sync::{broadcast, mpsc},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;

use crate::{
    config::QueueConfig,
    events::{Bus, Event},
    queue::RequestQueue,
    subscribers::{Subscribe, SubscriberSet},
};

use super::{
    command::{Command, Snapshot},
    handle::QueueHandle,
};

/// Receiver of start notifications: one `()` per promotion to active.
pub type StartSignals = mpsc::UnboundedReceiver<()>;

/// Everything returned by [`QueueDriver::spawn`].
pub struct SpawnedQueue<T> {
    /// Handle for submitting commands.
    pub handle: QueueHandle<T>,
    /// Start notifications, in promotion order.
    pub started: StartSignals,
    /// Bus the queue publishes its events on.
    pub bus: Bus,
    /// Driver task; finishes after cancellation or once every handle is dropped.
    pub join: JoinHandle<()>,
}

/// Runs a [`RequestQueue`] on its own tokio task.
///
/// The task owns the queue exclusively; all access goes through [`QueueHandle`].
/// Its loop waits on three sources:
/// ```text
/// loop {
///   select! {
///     token.cancelled()   ─► exit
///     command rx.recv()   ─► apply to queue (schedule / retry / release / ...)
///     queue.wakeup()      ─► try_start_next() with a fresh `now`
///   }
/// }
/// ```
/// Promotions fire the queue's start hook, which forwards to [`SpawnedQueue::started`].
pub struct QueueDriver {
    config: QueueConfig,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl QueueDriver {
    pub fn new(config: QueueConfig) -> Self {
        Self {
            config,
            subscribers: Vec::new(),
        }
    }

    /// Sets event subscribers; they receive every queue event through dedicated workers.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Spawns the driver task (and the subscriber listener, if any subscribers are set).
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<T>(self, token: CancellationToken) -> SpawnedQueue<T>
    where
        T: Clone + Send + 'static,
    {
        let bus = Bus::new(self.config.bus_capacity_clamped());
        let (tx, rx) = mpsc::channel(self.config.command_capacity_clamped());
        let (started_tx, started) = mpsc::unbounded_channel();

        let listener_token = token.child_token();
        if !self.subscribers.is_empty() {
            let set = SubscriberSet::new(self.subscribers, bus.clone());
            tokio::spawn(forward_events(
                bus.subscribe(),
                set,
                listener_token.clone(),
            ));
        }

        let queue = RequestQueue::builder(self.config.backoff)
            .with_bus(bus.clone())
            .on_start(move || {
                let _ = started_tx.send(());
            })
            .build();

        let join = tokio::spawn(async move {
            run(queue, rx, token).await;
            listener_token.cancel();
        });

        SpawnedQueue {
            handle: QueueHandle::new(tx),
            started,
            bus,
            join,
        }
    }
}

async fn run<T: Clone>(
    mut queue: RequestQueue<T>,
    mut rx: mpsc::Receiver<Command<T>>,
    token: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = token.cancelled() => break,

            cmd = rx.recv() => {
                let Some(cmd) = cmd else { break };
                if let Err(e) = apply(&mut queue, cmd) {
                    tracing::debug!(error = %e, "queue command reply not delivered");
                }
            }
            _ = queue.wakeup() => {}
        }
    }
    tracing::debug!(pending = queue.len(), "queue driver stopped");
}

fn apply<T: Clone>(queue: &mut RequestQueue<T>, cmd: Command<T>) -> anyhow::Result<()> {
    match cmd {
        Command::Schedule(payload) => {
            queue.schedule(payload);
        }
        Command::Retry { min_delay, reply } => {
            let res = queue.retry_active(min_delay).map(|_| ());
            reply.send(res).map_err(|_| anyhow!("retry caller went away"))?;
        }
        Command::Release { reply } => {
            reply
                .send(queue.release_active())
                .map_err(|_| anyhow!("release caller went away; payload dropped"))?;
        }
        Command::SetPolicy(policy) => queue.set_backoff_policy(policy),
        Command::RemovePending { pred, reply } => {
            reply
                .send(queue.remove_pending(pred))
                .map_err(|_| anyhow!("remove caller went away; payloads dropped"))?;
        }
        Command::Snapshot { reply } => {
            let snapshot = Snapshot {
                active: queue.active_payload().cloned(),
                active_failure_count: queue.active_failure_count().ok(),
                pending: queue.len(),
                next_release: queue.next_release_time().ok(),
                state: queue.state(),
            };
            reply
                .send(snapshot)
                .map_err(|_| anyhow!("snapshot caller went away"))?;
        }
    }
    Ok(())
}

/// Forwards bus events to the subscriber set until `token` is cancelled.
async fn forward_events(
    mut rx: broadcast::Receiver<Event>,
    set: SubscriberSet,
    token: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;

            res = rx.recv() => match res {
                Ok(ev) => set.emit(&ev),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "event listener lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            _ = token.cancelled() => break,
        }
    }
    set.shutdown().await;
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use tokio::time::Instant;

    use super::*;
    use crate::{BackoffPolicy, QueueError, QueueState, SubmitError, events::EventKind};

    fn config(first_secs: u64) -> QueueConfig {
        QueueConfig {
            backoff: BackoffPolicy {
                first: Duration::from_secs(first_secs),
                max: Duration::from_secs(60),
                factor: 2.0,
                ..BackoffPolicy::default()
            },
            ..QueueConfig::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn retry_and_release_through_handle() {
        let token = CancellationToken::new();
        let mut q = QueueDriver::new(config(1)).spawn::<String>(token.clone());

        q.handle.schedule("a".to_string()).await.expect("schedule");
        q.started.recv().await.expect("first start");

        let snap = q.handle.snapshot().await.expect("snapshot");
        assert_eq!(snap.active.as_deref(), Some("a"));
        assert_eq!(snap.active_failure_count, Some(0));
        assert_eq!(snap.state, QueueState::Active);

        let t0 = Instant::now();
        q.handle
            .retry_active(Duration::from_secs(2))
            .await
            .expect("retry");
        let snap = q.handle.snapshot().await.expect("snapshot");
        assert!(snap.active.is_none());
        assert_eq!(snap.pending, 1);
        assert!(matches!(snap.state, QueueState::Waiting { .. }));

        q.started.recv().await.expect("second start");
        assert!(Instant::now() >= t0 + Duration::from_secs(2));

        let snap = q.handle.snapshot().await.expect("snapshot");
        assert_eq!(snap.active_failure_count, Some(1));
        assert_eq!(
            q.handle.release_active().await.expect("release"),
            Some("a".to_string())
        );

        token.cancel();
        q.join.await.expect("driver join");
    }

    #[tokio::test(start_paused = true)]
    async fn queue_errors_surface_as_rejected() {
        let token = CancellationToken::new();
        let q = QueueDriver::new(config(1)).spawn::<u32>(token.clone());

        assert_eq!(
            q.handle.retry_active(Duration::ZERO).await,
            Err(SubmitError::Rejected(QueueError::NoActiveRequest))
        );
        assert_eq!(q.handle.release_active().await, Ok(None));

        token.cancel();
        q.join.await.expect("driver join");
        assert_eq!(q.handle.schedule(1).await, Err(SubmitError::Closed));
    }

    #[tokio::test(start_paused = true)]
    async fn try_schedule_reports_full() {
        let token = CancellationToken::new();
        let cfg = QueueConfig {
            command_capacity: 1,
            ..config(1)
        };
        let q = QueueDriver::new(cfg).spawn::<u32>(token.clone());

        assert_eq!(q.handle.try_schedule(1), Ok(()));
        assert_eq!(q.handle.try_schedule(2), Err(SubmitError::Full));
        token.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn remove_pending_through_handle() {
        let token = CancellationToken::new();
        let mut q = QueueDriver::new(config(1)).spawn::<u32>(token.clone());

        for p in 1..=4 {
            q.handle.schedule(p).await.expect("schedule");
        }
        q.started.recv().await.expect("start");

        let mut removed = q
            .handle
            .remove_pending(|p| p % 2 == 0)
            .await
            .expect("remove");
        removed.sort_unstable();
        assert_eq!(removed, vec![2, 4]);

        let snap = q.handle.snapshot().await.expect("snapshot");
        assert_eq!(snap.active, Some(1));
        assert_eq!(snap.pending, 1);
        token.cancel();
    }

    #[derive(Default)]
    struct Kinds(Mutex<Vec<EventKind>>);

    #[async_trait]
    impl Subscribe for Kinds {
        async fn on_event(&self, event: &Event) {
            self.0.lock().expect("lock").push(event.kind);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn subscribers_see_queue_events() {
        let token = CancellationToken::new();
        let kinds = Arc::new(Kinds::default());
        let mut q = QueueDriver::new(config(1))
            .with_subscribers(vec![kinds.clone() as Arc<dyn Subscribe>])
            .spawn::<u32>(token.clone());

        q.handle.schedule(7).await.expect("schedule");
        q.started.recv().await.expect("start");
        q.handle.release_active().await.expect("release");

        drop(q.handle);
        q.join.await.expect("driver join");
        tokio::time::sleep(Duration::from_millis(10)).await;

        let seen = kinds.0.lock().expect("lock").clone();
        assert_eq!(
            seen,
            vec![
                EventKind::RequestScheduled,
                EventKind::RequestStarted,
                EventKind::RequestReleased,
            ]
        );
    }
}
