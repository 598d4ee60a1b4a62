use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::dead_letter::{DeadLetter, DeadLetters};
use super::dispatcher::{DispatchOutcome, RoundRobinDispatcher};
use super::inflight::InFlight;
use crate::config::Config;
use crate::error::{Result, TaskError};
use crate::observability::Metrics;
use crate::status::{StatusEntry, StatusStore, TaskStatus};
use crate::task::{IdGenerator, NewTask, SequentialIds, Task, TaskId};
use crate::worker::{
    Executor, SimulatedExecutor, WorkerContext, WorkerId, WorkerPool, WorkerSnapshot, WorkerSpec,
    WorkerState,
};

/// Everything needed to start a [`Coordinator`]
pub struct CoordinatorOptions {
    pub queue_capacity: usize,
    pub workers: Vec<WorkerSpec>,
    pub executor: Arc<dyn Executor>,
    pub ids: Arc<dyn IdGenerator>,
    pub metrics: Arc<Metrics>,
}

impl CoordinatorOptions {
    pub fn new(queue_capacity: usize, workers: Vec<WorkerSpec>) -> Self {
        Self {
            queue_capacity,
            workers,
            executor: Arc::new(SimulatedExecutor::default()),
            ids: Arc::new(SequentialIds::new()),
            metrics: Arc::new(Metrics::new()),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.queue.capacity, config.pool.workers.clone())
            .with_execution_delay(config.pool.execution_delay.as_duration())
    }

    pub fn with_execution_delay(self, delay: Duration) -> Self {
        self.with_executor(Arc::new(SimulatedExecutor::new(delay)))
    }

    pub fn with_executor(mut self, executor: Arc<dyn Executor>) -> Self {
        self.executor = executor;
        self
    }

    pub fn with_ids(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = metrics;
        self
    }
}

/// Intake and completion coordinator
///
/// Owns the task pipeline:
/// 1. `submit` assigns an id, records `pending`, bumps the in-flight count
///    and pushes onto the bounded queue (waiting while it is full)
/// 2. A dispatcher task pops in FIFO order and hands each task to a
///    role-matching worker
/// 3. Workers mark `running`, execute, mark `done` and release the in-flight
///    slot
///
/// Unroutable tasks keep their `pending` status, are recorded as dead
/// letters and release their in-flight slot.
pub struct Coordinator {
    ids: Arc<dyn IdGenerator>,
    store: Arc<StatusStore>,
    in_flight: Arc<InFlight>,
    dead_letters: Arc<DeadLetters>,
    metrics: Arc<Metrics>,
    queue: RwLock<Option<mpsc::Sender<Task>>>,
    queue_capacity: usize,
    dispatcher: Mutex<Option<JoinHandle<()>>>,
    pool: Mutex<Option<WorkerPool>>,
}

impl Coordinator {
    /// Spawn the worker pool and dispatcher; must be called inside a tokio runtime
    pub fn start(options: CoordinatorOptions) -> Self {
        let CoordinatorOptions {
            queue_capacity,
            workers,
            executor,
            ids,
            metrics,
        } = options;

        info!(
            queue_capacity,
            num_workers = workers.len(),
            "Starting task coordinator"
        );

        let store = Arc::new(StatusStore::new());
        let in_flight = Arc::new(InFlight::new());
        let dead_letters = Arc::new(DeadLetters::new());

        let ctx = WorkerContext {
            store: store.clone(),
            in_flight: in_flight.clone(),
            executor,
            metrics: metrics.clone(),
        };
        let (pool, links) = WorkerPool::spawn(&workers, ctx);
        if pool.is_empty() {
            warn!("No workers configured, every task will be dead-lettered");
        }

        // tokio rejects zero-capacity channels; config validation keeps this at >= 1.
        let (queue_tx, queue_rx) = mpsc::channel(queue_capacity.max(1));
        let dispatcher = tokio::spawn(run_dispatcher(
            RoundRobinDispatcher::new(links),
            queue_rx,
            in_flight.clone(),
            dead_letters.clone(),
            metrics.clone(),
        ));

        Self {
            ids,
            store,
            in_flight,
            dead_letters,
            metrics,
            queue: RwLock::new(Some(queue_tx)),
            queue_capacity: queue_capacity.max(1),
            dispatcher: Mutex::new(Some(dispatcher)),
            pool: Mutex::new(Some(pool)),
        }
    }

    /// Accept a task and return its id
    ///
    /// Waits while the queue is full. The task is visible as `pending`
    /// before this returns. Nothing is recorded until a queue slot has been
    /// reserved, so dropping the future while it waits leaves no trace.
    pub async fn submit(&self, new_task: NewTask) -> Result<TaskId> {
        if let Err(err) = new_task.validate() {
            self.metrics.task_rejected();
            return Err(err);
        }

        let queue = self.queue_sender().ok_or(TaskError::Closed)?;
        let permit = queue.reserve().await.map_err(|_| TaskError::Closed)?;

        let id = self.ids.next_id();
        self.store
            .insert_pending(id)
            .map_err(|_| TaskError::DuplicateId(id))?;
        self.in_flight.begin();

        let task = new_task.into_task(id);
        let role = task.required_role.clone();
        permit.send(task);

        self.metrics.task_submitted();
        info!(task_id = id, role = %role, "Task accepted");
        Ok(id)
    }

    /// Current status, or `None` for an id that was never accepted
    pub fn status(&self, id: TaskId) -> Option<TaskStatus> {
        self.store.get(id)
    }

    pub fn get_status(&self, id: TaskId) -> Result<TaskStatus> {
        self.status(id).ok_or(TaskError::NotFound(id))
    }

    pub fn status_entry(&self, id: TaskId) -> Option<StatusEntry> {
        self.store.entry(id)
    }

    pub fn store(&self) -> &Arc<StatusStore> {
        &self.store
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.current()
    }

    pub fn is_accepting(&self) -> bool {
        self.queue_sender().is_some_and(|tx| !tx.is_closed())
    }

    /// Tasks waiting in the queue, not yet taken by the dispatcher
    pub fn queue_depth(&self) -> usize {
        self.queue_sender()
            .map(|tx| tx.max_capacity() - tx.capacity())
            .unwrap_or(0)
    }

    pub fn queue_capacity(&self) -> usize {
        self.queue_capacity
    }

    pub fn workers(&self) -> Vec<WorkerSnapshot> {
        self.lock_pool()
            .as_ref()
            .map(WorkerPool::snapshot)
            .unwrap_or_default()
    }

    pub fn worker_count(&self) -> usize {
        self.lock_pool().as_ref().map_or(0, WorkerPool::len)
    }

    pub fn worker_state(&self, worker_id: WorkerId) -> Option<watch::Receiver<WorkerState>> {
        self.lock_pool()
            .as_ref()
            .and_then(|pool| pool.subscribe(worker_id))
    }

    pub fn unroutable(&self, limit: usize) -> Vec<DeadLetter> {
        self.dead_letters.list(limit)
    }

    pub fn unroutable_count(&self) -> usize {
        self.dead_letters.len()
    }

    /// Wait until every accepted task has finished or been dead-lettered
    pub async fn wait_idle(&self) {
        self.in_flight.wait_idle().await;
    }

    /// Stop accepting new tasks; the dispatcher drains what is already queued
    pub fn close(&self) {
        let closed = self
            .queue
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if closed.is_some() {
            info!("Task queue closed");
        }
    }

    /// Wait for in-flight work to reach zero, then stop the dispatcher and
    /// every worker. There is no timeout.
    pub async fn drain_and_shutdown(&self) {
        info!(in_flight = self.in_flight.current(), "Draining task pipeline");
        self.wait_idle().await;
        self.close();

        let dispatcher = self
            .dispatcher
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = dispatcher {
            if let Err(err) = handle.await {
                error!(error = %err, "Dispatcher task failed");
            }
        }

        let pool = self.lock_pool().take();
        if let Some(pool) = pool {
            pool.join().await;
        }

        if !self.dead_letters.is_empty() {
            warn!(
                count = self.dead_letters.len(),
                "Shut down with unroutable tasks left pending"
            );
        }

        info!("Task pipeline stopped");
    }

    fn queue_sender(&self) -> Option<mpsc::Sender<Task>> {
        self.queue
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn lock_pool(&self) -> std::sync::MutexGuard<'_, Option<WorkerPool>> {
        self.pool.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Pop tasks in FIFO order until the queue is closed and empty
async fn run_dispatcher(
    mut dispatcher: RoundRobinDispatcher,
    mut queue: mpsc::Receiver<Task>,
    in_flight: Arc<InFlight>,
    dead_letters: Arc<DeadLetters>,
    metrics: Arc<Metrics>,
) {
    info!(num_workers = dispatcher.num_workers(), "Dispatcher started");

    while let Some(task) = queue.recv().await {
        match dispatcher.dispatch(task).await {
            DispatchOutcome::Assigned { .. } => metrics.task_dispatched(),
            DispatchOutcome::Unroutable { task, reason } => {
                dead_letters.record(task, reason);
                metrics.task_unroutable();
                in_flight.finish();
            }
        }
    }

    info!("Task queue drained, dispatcher stopping");
}
