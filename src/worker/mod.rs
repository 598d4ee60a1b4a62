//! Worker pool
//!
//! Each worker is bound to one role for its whole life. It takes tasks from
//! its private hand-off channel, executes them and records status changes,
//! publishing an explicit [`WorkerState`] so callers can tell whether it is
//! busy without sleeping and guessing.

pub mod executor;
pub mod handoff;
pub mod pool;

pub use executor::{Executor, SimulatedExecutor};
pub use handoff::{HandoffClosed, HandoffReceiver, HandoffSender};
pub use pool::{WorkerLink, WorkerPool, WorkerSnapshot};

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::observability::Metrics;
use crate::queue::InFlight;
use crate::status::StatusStore;
use crate::task::TaskId;

pub type WorkerId = usize;

/// Role assignment for one worker slot
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct WorkerSpec {
    pub role: String,
    /// Defaults to `Worker-<id>`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl WorkerSpec {
    pub fn new(role: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            name: None,
        }
    }

    pub fn named(role: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            name: Some(name.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkerIdentity {
    pub id: WorkerId,
    pub name: String,
    pub role: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerState {
    Idle,
    Executing(TaskId),
}

impl WorkerState {
    pub fn is_busy(&self) -> bool {
        matches!(self, WorkerState::Executing(_))
    }
}

/// Shared handles every worker loop needs
#[derive(Clone)]
pub struct WorkerContext {
    pub store: Arc<StatusStore>,
    pub in_flight: Arc<InFlight>,
    pub executor: Arc<dyn Executor>,
    pub metrics: Arc<Metrics>,
}

pub struct Worker {
    identity: WorkerIdentity,
    inbox: HandoffReceiver,
    state: watch::Sender<WorkerState>,
    ctx: WorkerContext,
}

impl Worker {
    pub fn new(
        identity: WorkerIdentity,
        inbox: HandoffReceiver,
        state: watch::Sender<WorkerState>,
        ctx: WorkerContext,
    ) -> Self {
        Self {
            identity,
            inbox,
            state,
            ctx,
        }
    }

    /// Consume tasks until the hand-off channel closes
    pub async fn run(mut self) {
        debug!(worker_id = self.identity.id, role = %self.identity.role, "Worker started");

        while let Some(task) = self.inbox.recv().await {
            if let Err(err) = self.ctx.store.mark_running(task.id) {
                warn!(worker_id = self.identity.id, task_id = task.id, error = %err, "Unexpected status before execution");
            }
            self.state.send_replace(WorkerState::Executing(task.id));

            self.ctx.executor.execute(&self.identity, &task).await;

            if let Err(err) = self.ctx.store.mark_done(task.id) {
                warn!(worker_id = self.identity.id, task_id = task.id, error = %err, "Unexpected status after execution");
            }
            info!(worker_id = self.identity.id, task_id = task.id, "Task finished");

            self.state.send_replace(WorkerState::Idle);
            self.ctx.metrics.task_completed();
            self.ctx.in_flight.finish();
        }

        debug!(worker_id = self.identity.id, "Worker inbox closed, stopping");
    }
}
