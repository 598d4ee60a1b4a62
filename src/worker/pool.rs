use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

use super::{
    HandoffSender, Worker, WorkerContext, WorkerId, WorkerIdentity, WorkerSpec, WorkerState,
    handoff,
};

/// Dispatcher-side end of one worker: who it is and how to reach it
#[derive(Debug, Clone)]
pub struct WorkerLink {
    pub identity: WorkerIdentity,
    pub sender: HandoffSender,
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkerSnapshot {
    #[serde(flatten)]
    pub identity: WorkerIdentity,
    pub state: WorkerState,
}

struct WorkerHandle {
    identity: WorkerIdentity,
    state: watch::Receiver<WorkerState>,
    join: JoinHandle<()>,
}

/// Fixed set of running workers
///
/// The pool keeps the join handles and state receivers; the hand-off senders
/// are returned separately as [`WorkerLink`]s for the dispatcher. Workers stop
/// once every link to them has been dropped.
pub struct WorkerPool {
    workers: Vec<WorkerHandle>,
}

impl WorkerPool {
    /// Spawn one worker per spec; must be called inside a tokio runtime
    pub fn spawn(specs: &[WorkerSpec], ctx: WorkerContext) -> (Self, Vec<WorkerLink>) {
        info!(num_workers = specs.len(), "Starting worker pool");

        let mut workers = Vec::with_capacity(specs.len());
        let mut links = Vec::with_capacity(specs.len());

        for (index, spec) in specs.iter().enumerate() {
            let id = index + 1;
            let identity = WorkerIdentity {
                id,
                name: spec.name.clone().unwrap_or_else(|| format!("Worker-{id}")),
                role: spec.role.clone(),
            };

            let (sender, inbox) = handoff::channel();
            let (state_tx, state_rx) = watch::channel(WorkerState::Idle);

            let worker = Worker::new(identity.clone(), inbox, state_tx, ctx.clone());
            let join = tokio::spawn(worker.run());

            links.push(WorkerLink {
                identity: identity.clone(),
                sender,
            });
            workers.push(WorkerHandle {
                identity,
                state: state_rx,
                join,
            });
        }

        (Self { workers }, links)
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    pub fn snapshot(&self) -> Vec<WorkerSnapshot> {
        self.workers
            .iter()
            .map(|worker| WorkerSnapshot {
                identity: worker.identity.clone(),
                state: *worker.state.borrow(),
            })
            .collect()
    }

    /// Watch a worker's state transitions
    pub fn subscribe(&self, worker_id: WorkerId) -> Option<watch::Receiver<WorkerState>> {
        self.workers
            .iter()
            .find(|worker| worker.identity.id == worker_id)
            .map(|worker| worker.state.clone())
    }

    /// Wait for every worker loop to exit
    pub async fn join(self) {
        for worker in self.workers {
            if let Err(err) = worker.join.await {
                error!(worker_id = worker.identity.id, error = %err, "Worker task failed");
            }
        }
        info!("Worker pool stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::Metrics;
    use crate::queue::InFlight;
    use crate::status::{StatusStore, TaskStatus};
    use crate::task::Task;
    use crate::worker::SimulatedExecutor;
    use std::sync::Arc;
    use std::time::Duration;

    fn context(delay: Duration) -> WorkerContext {
        WorkerContext {
            store: Arc::new(StatusStore::new()),
            in_flight: Arc::new(InFlight::new()),
            executor: Arc::new(SimulatedExecutor::new(delay)),
            metrics: Arc::new(Metrics::new()),
        }
    }

    fn task(id: u64, role: &str) -> Task {
        Task {
            id,
            description: format!("task {id}"),
            priority: 0,
            required_role: role.to_string(),
        }
    }

    #[tokio::test]
    async fn test_spawn_assigns_ids_names_and_roles() {
        let specs = vec![
            WorkerSpec::new("DevOps"),
            WorkerSpec::named("QA", "tester"),
        ];
        let (pool, links) = WorkerPool::spawn(&specs, context(Duration::from_millis(1)));

        assert_eq!(pool.len(), 2);
        assert_eq!(links[0].identity.name, "Worker-1");
        assert_eq!(links[0].identity.role, "DevOps");
        assert_eq!(links[1].identity.id, 2);
        assert_eq!(links[1].identity.name, "tester");
        assert!(pool.snapshot().iter().all(|w| w.state == WorkerState::Idle));

        drop(links);
        pool.join().await;
    }

    #[tokio::test]
    async fn test_worker_runs_task_to_done() {
        let ctx = context(Duration::from_millis(100));
        let store = ctx.store.clone();
        let in_flight = ctx.in_flight.clone();

        let (pool, links) = WorkerPool::spawn(&[WorkerSpec::new("DevOps")], ctx);
        let mut state = pool.subscribe(1).unwrap();

        store.insert_pending(1).unwrap();
        in_flight.begin();
        links[0].sender.send(task(1, "DevOps")).await.unwrap();

        state
            .wait_for(|s| *s == WorkerState::Executing(1))
            .await
            .unwrap();
        assert_eq!(store.get(1), Some(TaskStatus::Running));

        state.wait_for(|s| *s == WorkerState::Idle).await.unwrap();
        assert_eq!(store.get(1), Some(TaskStatus::Done));

        in_flight.wait_idle().await;
        assert_eq!(in_flight.current(), 0);

        drop(links);
        pool.join().await;
    }

    #[tokio::test]
    async fn test_busy_worker_blocks_next_handoff() {
        let ctx = context(Duration::from_millis(300));
        let store = ctx.store.clone();
        let (pool, links) = WorkerPool::spawn(&[WorkerSpec::new("DevOps")], ctx);
        let mut state = pool.subscribe(1).unwrap();

        for id in [1, 2] {
            store.insert_pending(id).unwrap();
        }
        links[0].sender.send(task(1, "DevOps")).await.unwrap();
        state.wait_for(|s| s.is_busy()).await.unwrap();

        let sender = links[0].sender.clone();
        let second = tokio::spawn(async move { sender.send(task(2, "DevOps")).await });

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!second.is_finished());
        assert_eq!(store.get(2), Some(TaskStatus::Pending));

        second.await.unwrap().unwrap();
        drop(links);
        pool.join().await;
        assert_eq!(store.get(2), Some(TaskStatus::Done));
    }

    #[test]
    fn test_worker_state_serialization() {
        let idle = serde_json::to_value(WorkerState::Idle).unwrap();
        assert_eq!(idle, "idle");

        let busy = serde_json::to_value(WorkerState::Executing(3)).unwrap();
        assert_eq!(busy["executing"], 3);
    }
}
