//! In-process counters for the task pipeline and the HTTP surface

use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use tracing_subscriber::EnvFilter;

/// Metrics handle for recording counters
#[derive(Debug, Default)]
pub struct Metrics {
    tasks_submitted: AtomicU64,
    tasks_rejected: AtomicU64,
    tasks_dispatched: AtomicU64,
    tasks_unroutable: AtomicU64,
    tasks_completed: AtomicU64,
    requests: Mutex<BTreeMap<String, u64>>,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn task_submitted(&self) {
        self.tasks_submitted.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "tasks_submitted", "Metric incremented");
    }

    pub fn task_rejected(&self) {
        self.tasks_rejected.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "tasks_rejected", "Metric incremented");
    }

    pub fn task_dispatched(&self) {
        self.tasks_dispatched.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "tasks_dispatched", "Metric incremented");
    }

    pub fn task_unroutable(&self) {
        self.tasks_unroutable.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "tasks_unroutable", "Metric incremented");
    }

    pub fn task_completed(&self) {
        self.tasks_completed.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "tasks_completed", "Metric incremented");
    }

    /// Count one HTTP request against its route
    pub fn request(&self, path: &str) {
        let mut requests = self.requests.lock().unwrap_or_else(PoisonError::into_inner);
        *requests.entry(path.to_string()).or_default() += 1;
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            tasks_submitted: self.tasks_submitted.load(Ordering::Relaxed),
            tasks_rejected: self.tasks_rejected.load(Ordering::Relaxed),
            tasks_dispatched: self.tasks_dispatched.load(Ordering::Relaxed),
            tasks_unroutable: self.tasks_unroutable.load(Ordering::Relaxed),
            tasks_completed: self.tasks_completed.load(Ordering::Relaxed),
            http_requests: self
                .requests
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub tasks_submitted: u64,
    pub tasks_rejected: u64,
    pub tasks_dispatched: u64,
    pub tasks_unroutable: u64,
    pub tasks_completed: u64,
    pub http_requests: BTreeMap<String, u64>,
}

/// Install the global fmt subscriber, filtered by `RUST_LOG` (default `info`)
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
