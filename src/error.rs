use thiserror::Error;

use crate::task::TaskId;

/// Errors surfaced synchronously by the intake and status paths
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TaskError {
    #[error("invalid task submission: {0}")]
    Validation(String),

    #[error("task {0} not found")]
    NotFound(TaskId),

    #[error("task queue is closed")]
    Closed,

    #[error("task id {0} was issued twice")]
    DuplicateId(TaskId),
}

pub type Result<T> = std::result::Result<T, TaskError>;
