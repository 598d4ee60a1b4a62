//! Task model shared by intake, dispatch and the worker pool.
//!
//! A [`Task`] is immutable once the intake path has given it an id. Clients
//! only ever submit a [`NewTask`]; any `id` or `done` field in a submission
//! body is ignored.

mod ids;

pub use ids::{IdGenerator, SequentialIds};

use serde::{Deserialize, Serialize};

use crate::error::TaskError;

pub type TaskId = u64;

/// Unit of work routed to a worker whose role equals `required_role`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub description: String,
    /// Recorded for clients, not consulted by the dispatcher
    pub priority: i64,
    pub required_role: String,
}

/// Submission payload, before an id has been assigned
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, bon::Builder)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    #[serde(default)]
    #[builder(into)]
    pub description: String,
    #[serde(default)]
    #[builder(default)]
    pub priority: i64,
    #[serde(default)]
    #[builder(into)]
    pub required_role: String,
}

impl NewTask {
    /// Reject submissions missing a description or a required role
    pub fn validate(&self) -> Result<(), TaskError> {
        if self.description.trim().is_empty() {
            return Err(TaskError::Validation("description is required".into()));
        }
        if self.required_role.trim().is_empty() {
            return Err(TaskError::Validation("requiredRole is required".into()));
        }
        Ok(())
    }

    pub fn into_task(self, id: TaskId) -> Task {
        Task {
            id,
            description: self.description,
            priority: self.priority,
            required_role: self.required_role,
        }
    }
}
