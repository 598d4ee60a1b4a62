use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::sync::{Mutex, PoisonError};
use tracing::info;

use crate::task::Task;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnroutableReason {
    /// No worker in the pool advertises the task's role
    NoMatchingRole,
    /// A matching worker was chosen but its loop had already exited
    WorkerUnavailable,
}

impl fmt::Display for UnroutableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnroutableReason::NoMatchingRole => f.write_str("no_matching_role"),
            UnroutableReason::WorkerUnavailable => f.write_str("worker_unavailable"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DeadLetter {
    pub task: Task,
    pub reason: UnroutableReason,
    pub recorded_at: DateTime<Utc>,
}

/// In-memory record of tasks the dispatcher could not route
///
/// Their status stays `pending`; this list is how operators find them.
#[derive(Debug, Default)]
pub struct DeadLetters {
    entries: Mutex<Vec<DeadLetter>>,
}

impl DeadLetters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, task: Task, reason: UnroutableReason) {
        info!(task_id = task.id, role = %task.required_role, %reason, "Task moved to dead letters");
        let letter = DeadLetter {
            task,
            reason,
            recorded_at: Utc::now(),
        };
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(letter);
    }

    /// Oldest first, at most `limit` entries
    pub fn list(&self, limit: usize) -> Vec<DeadLetter> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .take(limit)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
