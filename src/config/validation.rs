use super::models::Config;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("queue.capacity must be at least 1")]
    ZeroQueueCapacity,

    #[error("pool.workers must list at least one worker")]
    NoWorkersConfigured,

    #[error("worker #{index} has an empty role")]
    EmptyWorkerRole { index: usize },

    #[error("worker name '{name}' is used more than once")]
    DuplicateWorkerName { name: String },

    #[error("server.max_body_bytes must be positive")]
    ZeroBodyLimit,
}

/// Validate the entire configuration
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    validate_server(config)?;
    validate_queue(config)?;
    validate_pool(config)?;
    Ok(())
}

fn validate_server(config: &Config) -> Result<(), ValidationError> {
    if config.server.max_body_bytes.as_u64() == 0 {
        return Err(ValidationError::ZeroBodyLimit);
    }
    Ok(())
}

fn validate_queue(config: &Config) -> Result<(), ValidationError> {
    if config.queue.capacity == 0 {
        return Err(ValidationError::ZeroQueueCapacity);
    }
    Ok(())
}

/// Every worker needs a role; explicit names must be unique
fn validate_pool(config: &Config) -> Result<(), ValidationError> {
    if config.pool.workers.is_empty() {
        return Err(ValidationError::NoWorkersConfigured);
    }

    let mut names = std::collections::HashSet::new();
    for (index, worker) in config.pool.workers.iter().enumerate() {
        if worker.role.trim().is_empty() {
            return Err(ValidationError::EmptyWorkerRole { index: index + 1 });
        }
        if let Some(name) = &worker.name {
            if !names.insert(name.as_str()) {
                return Err(ValidationError::DuplicateWorkerName { name: name.clone() });
            }
        }
    }

    Ok(())
}
