use tracing::{debug, warn};

use super::dead_letter::UnroutableReason;
use crate::task::Task;
use crate::worker::{HandoffClosed, WorkerId, WorkerLink};

/// What happened to one task taken off the queue
#[derive(Debug)]
pub enum DispatchOutcome {
    Assigned { worker_id: WorkerId },
    Unroutable { task: Task, reason: UnroutableReason },
}

/// Routes tasks to role-matching workers in round-robin order
///
/// The cursor moves one slot per candidate inspected, matching or not, so
/// fairness holds among the workers visited rather than strictly per role.
/// Dropping the dispatcher closes every worker's hand-off channel.
pub struct RoundRobinDispatcher {
    workers: Vec<WorkerLink>,
    cursor: usize,
}

impl RoundRobinDispatcher {
    pub fn new(workers: Vec<WorkerLink>) -> Self {
        Self { workers, cursor: 0 }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn num_workers(&self) -> usize {
        self.workers.len()
    }

    /// Scan at most one full lap from the cursor for a worker with `role`
    pub fn select(&mut self, role: &str) -> Option<usize> {
        let total = self.workers.len();
        for _ in 0..total {
            let index = self.cursor;
            self.cursor = (self.cursor + 1) % total;
            if self.workers[index].identity.role == role {
                return Some(index);
            }
        }
        None
    }

    /// Hand `task` to the next matching worker, waiting until it is taken
    pub async fn dispatch(&mut self, task: Task) -> DispatchOutcome {
        debug!(task_id = task.id, role = %task.required_role, "Dispatching task");

        let Some(index) = self.select(&task.required_role) else {
            warn!(task_id = task.id, role = %task.required_role, "No worker found for role");
            return DispatchOutcome::Unroutable {
                task,
                reason: UnroutableReason::NoMatchingRole,
            };
        };

        let link = &self.workers[index];
        let task_id = task.id;
        match link.sender.send(task).await {
            Ok(()) => {
                debug!(task_id, worker = %link.identity.name, "Task assigned");
                DispatchOutcome::Assigned {
                    worker_id: link.identity.id,
                }
            }
            Err(HandoffClosed(task)) => {
                warn!(task_id, worker = %link.identity.name, "Worker hand-off closed, task not delivered");
                DispatchOutcome::Unroutable {
                    task,
                    reason: UnroutableReason::WorkerUnavailable,
                }
            }
        }
    }
}
