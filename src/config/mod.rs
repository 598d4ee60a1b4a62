//! Configuration management for the task server
//!
//! Settings are layered, lowest priority first:
//! 1. Default values (embedded in structs)
//! 2. TOML configuration file
//! 3. Environment variables
//!
//! # Usage
//!
//! ```no_run
//! use taskserver::config::Config;
//!
//! let config = Config::load().expect("Failed to load configuration");
//! println!("Server listening on: {}", config.server.bind_addr);
//! ```
//!
//! # Environment Variables
//!
//! Overrides follow the pattern `TASKSERVER__<section>__<key>`:
//! - `TASKSERVER__SERVER__BIND_ADDR=0.0.0.0:9000`
//! - `TASKSERVER__QUEUE__CAPACITY=100`
//! - `TASKSERVER__POOL__EXECUTION_DELAY=250ms`
//!
//! # Configuration File
//!
//! Read from `config/taskserver.toml` unless `TASKSERVER_CONFIG` points
//! elsewhere. The worker list can only be set from the file:
//!
//! ```toml
//! [[pool.workers]]
//! role = "DevOps"
//!
//! [[pool.workers]]
//! role = "QA"
//! name = "qa-1"
//! ```

mod models;
mod sources;
mod validation;

pub use crate::humanize::{ByteSize, HumanDuration};
pub use models::{Config, PoolConfig, QueueConfig, ServerConfig};
pub use validation::ValidationError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] ValidationError),

    #[error("Failed to render configuration: {0}")]
    RenderError(#[from] toml::ser::Error),
}

impl Config {
    /// Load configuration from all sources (file + environment) and validate it
    pub fn load() -> Result<Self, ConfigError> {
        let config = sources::load()?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: std::path::PathBuf) -> Result<Self, ConfigError> {
        let config = sources::load_from_sources(path)?;
        validation::validate(&config)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validation::validate(self)?;
        Ok(())
    }

    /// Render the effective configuration as TOML
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}
