use std::sync::Arc;

use crate::config::Config;
use crate::observability::Metrics;
use crate::queue::Coordinator;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub coordinator: Arc<Coordinator>,
}

impl AppState {
    pub fn new(config: Config, coordinator: Arc<Coordinator>) -> Self {
        Self {
            config: Arc::new(config),
            coordinator,
        }
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        self.coordinator.metrics()
    }
}
