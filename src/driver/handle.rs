use std::time::Duration;

use tokio::sync::{mpsc, oneshot};

use crate::policies::BackoffPolicy;

use super::{
    command::{Command, Snapshot},
    error::SubmitError,
};

/// Cloneable handle for talking to a driven [`RequestQueue`](crate::RequestQueue).
pub struct QueueHandle<T> {
    tx: mpsc::Sender<Command<T>>,
}

impl<T> Clone for QueueHandle<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<T: Send + 'static> QueueHandle<T> {
    pub(super) fn new(tx: mpsc::Sender<Command<T>>) -> Self {
        Self { tx }
    }

    /// Schedules a payload (waits if the command queue is full).
    pub async fn schedule(&self, payload: T) -> Result<(), SubmitError> {
        self.send(Command::Schedule(payload)).await
    }

    /// Schedules a payload without waiting; fails with `Full` when the command queue is full.
    pub fn try_schedule(&self, payload: T) -> Result<(), SubmitError> {
        self.tx
            .try_send(Command::Schedule(payload))
            .map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => SubmitError::Full,
                mpsc::error::TrySendError::Closed(_) => SubmitError::Closed,
            })
    }

    /// Reports failure of the active request; see
    /// [`RequestQueue::retry_active`](crate::RequestQueue::retry_active).
    pub async fn retry_active(&self, min_delay: Duration) -> Result<(), SubmitError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Retry { min_delay, reply }).await?;
        rx.await.map_err(|_| SubmitError::Closed)??;
        Ok(())
    }

    /// Completes the active request and returns its payload.
    pub async fn release_active(&self) -> Result<Option<T>, SubmitError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Release { reply }).await?;
        rx.await.map_err(|_| SubmitError::Closed)
    }

    /// Replaces the policy for requests scheduled from now on.
    pub async fn set_backoff_policy(&self, policy: BackoffPolicy) -> Result<(), SubmitError> {
        self.send(Command::SetPolicy(policy)).await
    }

    /// Removes matching pending requests and returns their payloads.
    pub async fn remove_pending<F>(&self, pred: F) -> Result<Vec<T>, SubmitError>
    where
        F: FnMut(&T) -> bool + Send + 'static,
    {
        let (reply, rx) = oneshot::channel();
        self.send(Command::RemovePending {
            pred: Box::new(pred),
            reply,
        })
        .await?;
        rx.await.map_err(|_| SubmitError::Closed)
    }

    /// Returns a point-in-time view of the queue.
    pub async fn snapshot(&self) -> Result<Snapshot<T>, SubmitError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Snapshot { reply }).await?;
        rx.await.map_err(|_| SubmitError::Closed)
    }

    async fn send(&self, cmd: Command<T>) -> Result<(), SubmitError> {
        self.tx.send(cmd).await.map_err(|_| SubmitError::Closed)
    }
}
