//! Unbuffered hand-off from the dispatcher to a single worker.
//!
//! `send` resolves only once the worker has taken the task, so the dispatcher
//! never runs ahead of a busy worker.

use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use crate::task::Task;

#[derive(Debug)]
struct Offer {
    task: Task,
    taken: oneshot::Sender<()>,
}

/// The receiving worker is gone; the undelivered task is handed back
#[derive(Debug, Error)]
#[error("worker hand-off closed before task {} was taken", .0.id)]
pub struct HandoffClosed(pub Task);

#[derive(Debug, Clone)]
pub struct HandoffSender {
    tx: mpsc::Sender<Offer>,
}

#[derive(Debug)]
pub struct HandoffReceiver {
    rx: mpsc::Receiver<Offer>,
}

pub fn channel() -> (HandoffSender, HandoffReceiver) {
    let (tx, rx) = mpsc::channel(1);
    (HandoffSender { tx }, HandoffReceiver { rx })
}

impl HandoffSender {
    /// Offer a task and wait until the worker accepts it
    pub async fn send(&self, task: Task) -> Result<(), HandoffClosed> {
        let task_id = task.id;
        let (taken_tx, taken_rx) = oneshot::channel();
        let offer = Offer {
            task,
            taken: taken_tx,
        };

        let failed = match self.tx.reserve().await {
            Ok(permit) => {
                // Kept only to hand back if the worker exits before acking.
                let copy = offer.task.clone();
                permit.send(offer);
                copy
            }
            Err(_) => return Err(HandoffClosed(offer.task)),
        };

        // Dropped without an ack means the worker exited with the offer buffered.
        match taken_rx.await {
            Ok(()) => Ok(()),
            Err(_) => {
                debug!(task_id, "Worker dropped a buffered offer");
                Err(HandoffClosed(failed))
            }
        }
    }
}

impl HandoffReceiver {
    /// Take the next task; `None` once every sender has been dropped
    pub async fn recv(&mut self) -> Option<Task> {
        loop {
            let offer = self.rx.recv().await?;
            if offer.taken.send(()).is_ok() {
                return Some(offer.task);
            }
            debug!(task_id = offer.task.id, "Sender abandoned offer, skipping");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn task(id: u64) -> Task {
        Task {
            id,
            description: format!("task {id}"),
            priority: 0,
            required_role: "DevOps".to_string(),
        }
    }

    #[tokio::test]
    async fn test_send_waits_for_receiver() {
        let (tx, mut rx) = channel();

        let send = tokio::spawn(async move { tx.send(task(1)).await });

        // Nobody has taken the task yet.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!send.is_finished());

        let received = rx.recv().await.unwrap();
        assert_eq!(received.id, 1);
        send.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_send_to_dropped_receiver_returns_task() {
        let (tx, rx) = channel();
        drop(rx);

        let err = tx.send(task(9)).await.unwrap_err();
        assert_eq!(err.0.id, 9);
    }

    #[tokio::test]
    async fn test_receiver_dropped_with_offer_buffered() {
        let (tx, rx) = channel();

        let send = tokio::spawn(async move { tx.send(task(4)).await });
        tokio::time::sleep(Duration::from_millis(20)).await;
        drop(rx);

        let err = send.await.unwrap().unwrap_err();
        assert_eq!(err.0.id, 4);
    }

    #[tokio::test]
    async fn test_recv_ends_when_senders_dropped() {
        let (tx, mut rx) = channel();
        drop(tx);
        assert!(rx.recv().await.is_none());
    }
}
