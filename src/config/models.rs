use crate::humanize::{ByteSize, HumanDuration};
use crate::worker::WorkerSpec;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub queue: QueueConfig,
    #[serde(default)]
    pub pool: PoolConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,
    /// Largest accepted `POST /task` body
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: ByteSize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

fn default_max_body_bytes() -> ByteSize {
    ByteSize(64 * 1024) // 64 KB
}

/// Shared task queue between intake and the dispatcher
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QueueConfig {
    /// Submissions wait once this many tasks are queued
    #[serde(default = "default_queue_capacity")]
    pub capacity: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            capacity: default_queue_capacity(),
        }
    }
}

fn default_queue_capacity() -> usize {
    20
}

/// Worker pool layout
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PoolConfig {
    /// How long the simulated executor spends on each task
    #[serde(default = "default_execution_delay")]
    pub execution_delay: HumanDuration,
    /// One entry per worker, in dispatch order
    #[serde(default = "default_workers")]
    pub workers: Vec<WorkerSpec>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            execution_delay: default_execution_delay(),
            workers: default_workers(),
        }
    }
}

fn default_execution_delay() -> HumanDuration {
    HumanDuration::from_millis(1000)
}

fn default_workers() -> Vec<WorkerSpec> {
    (0..3).map(|_| WorkerSpec::new("DevOps")).collect()
}
