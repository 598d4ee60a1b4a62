use async_trait::async_trait;
use std::time::Duration;
use tracing::info;

use super::WorkerIdentity;
use crate::task::Task;

/// Performs the work a task describes. Execution always succeeds.
#[async_trait]
pub trait Executor: Send + Sync {
    async fn execute(&self, worker: &WorkerIdentity, task: &Task);
}

/// Stands in for real work by sleeping for a fixed duration
#[derive(Debug, Clone)]
pub struct SimulatedExecutor {
    delay: Duration,
}

impl SimulatedExecutor {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Default for SimulatedExecutor {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

#[async_trait]
impl Executor for SimulatedExecutor {
    async fn execute(&self, worker: &WorkerIdentity, task: &Task) {
        info!(
            worker = %worker.name,
            role = %worker.role,
            task_id = task.id,
            description = %task.description,
            "Executing task"
        );
        tokio::time::sleep(self.delay).await;
    }
}
