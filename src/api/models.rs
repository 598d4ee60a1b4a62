//! Wire models for the task server HTTP API.
//!
//! Submissions use the task's external field names:
//!
//! ```json
//! { "description": "Deploy", "priority": 1, "requiredRole": "DevOps" }
//! ```
//!
//! `id` and `done` are accepted but ignored on submit; the server assigns the
//! id and derives `done` from the tracked status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::status::TaskStatus;
use crate::task::TaskId;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TaskAcceptedResponse {
    pub task_id: TaskId,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TaskStatusResponse {
    pub id: TaskId,
    pub status: TaskStatus,
    pub done: bool,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    pub id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub components: HashMap<String, String>,
    pub version: String,
    pub in_flight: usize,
    pub queue_depth: usize,
    pub queue_capacity: usize,
    pub unroutable: usize,
}
