//! Concurrent task status store
//!
//! One mutex guards the whole map. Every operation reads or writes a single
//! entry and releases the lock before returning, so callers never hold it
//! across an `.await`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tracing::debug;

use crate::task::TaskId;

/// Task lifecycle: `pending` -> `running` -> `done`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Running,
    Done,
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Running => "running",
            TaskStatus::Done => "done",
        }
    }

    pub fn is_done(self) -> bool {
        self == TaskStatus::Done
    }

    /// Only single forward steps are allowed
    pub fn can_advance_to(self, next: TaskStatus) -> bool {
        matches!(
            (self, next),
            (TaskStatus::Pending, TaskStatus::Running) | (TaskStatus::Running, TaskStatus::Done)
        )
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusEntry {
    pub status: TaskStatus,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("task {0} is not tracked")]
    Unknown(TaskId),

    #[error("task {0} is already tracked")]
    AlreadyTracked(TaskId),

    #[error("task {id} cannot move from {from} to {to}")]
    Invalid {
        id: TaskId,
        from: TaskStatus,
        to: TaskStatus,
    },
}

/// Per-status totals, used by health and metrics reporting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub pending: usize,
    pub running: usize,
    pub done: usize,
}

#[derive(Debug, Default)]
pub struct StatusStore {
    entries: Mutex<HashMap<TaskId, StatusEntry>>,
}

impl StatusStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<TaskId, StatusEntry>> {
        // A panicking writer leaves the map itself intact.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start tracking a newly accepted task
    pub fn insert_pending(&self, id: TaskId) -> Result<(), TransitionError> {
        let mut entries = self.lock();
        if entries.contains_key(&id) {
            return Err(TransitionError::AlreadyTracked(id));
        }
        entries.insert(
            id,
            StatusEntry {
                status: TaskStatus::Pending,
                updated_at: Utc::now(),
            },
        );
        Ok(())
    }

    /// Move a task one step forward, returning the previous status
    pub fn advance(&self, id: TaskId, to: TaskStatus) -> Result<TaskStatus, TransitionError> {
        let mut entries = self.lock();
        let entry = entries.get_mut(&id).ok_or(TransitionError::Unknown(id))?;

        let from = entry.status;
        if !from.can_advance_to(to) {
            return Err(TransitionError::Invalid { id, from, to });
        }

        entry.status = to;
        entry.updated_at = Utc::now();
        debug!(task_id = id, %from, %to, "Task status updated");
        Ok(from)
    }

    pub fn mark_running(&self, id: TaskId) -> Result<TaskStatus, TransitionError> {
        self.advance(id, TaskStatus::Running)
    }

    pub fn mark_done(&self, id: TaskId) -> Result<TaskStatus, TransitionError> {
        self.advance(id, TaskStatus::Done)
    }

    pub fn get(&self, id: TaskId) -> Option<TaskStatus> {
        self.lock().get(&id).map(|entry| entry.status)
    }

    pub fn entry(&self, id: TaskId) -> Option<StatusEntry> {
        self.lock().get(&id).copied()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn counts(&self) -> StatusCounts {
        let entries = self.lock();
        let mut counts = StatusCounts::default();
        for entry in entries.values() {
            match entry.status {
                TaskStatus::Pending => counts.pending += 1,
                TaskStatus::Running => counts.running += 1,
                TaskStatus::Done => counts.done += 1,
            }
        }
        counts
    }

    /// All entries ordered by task id
    pub fn snapshot(&self) -> Vec<(TaskId, StatusEntry)> {
        let mut all: Vec<_> = self
            .lock()
            .iter()
            .map(|(id, entry)| (*id, *entry))
            .collect();
        all.sort_by_key(|(id, _)| *id);
        all
    }
}
