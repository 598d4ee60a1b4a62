use std::sync::atomic::{AtomicU64, Ordering};

use super::TaskId;

/// Source of task ids, injected into the coordinator
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> TaskId;
}

/// Monotonic ids backed by an atomic counter; the first id is 1
#[derive(Debug)]
pub struct SequentialIds {
    next: AtomicU64,
}

impl SequentialIds {
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }
}

impl Default for SequentialIds {
    fn default() -> Self {
        Self::new()
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&self) -> TaskId {
        self.next.fetch_add(1, Ordering::SeqCst)
    }
}
