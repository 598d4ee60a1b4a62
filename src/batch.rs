use tracing::{info, warn};

use taskserver::config::Config;
use taskserver::queue::{Coordinator, CoordinatorOptions};

use crate::cli::BatchArgs;

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Submit every task, wait for the pool to drain, then print final statuses
pub async fn run(args: BatchArgs) -> Result<(), AnyError> {
    let config = Config::load()?;
    let mut options = CoordinatorOptions::from_config(&config);
    if let Some(delay) = args.delay {
        options = options.with_execution_delay(delay.as_duration());
    }

    let coordinator = Coordinator::start(options);

    for task in args.tasks {
        let description = task.description.clone();
        match coordinator.submit(task).await {
            Ok(id) => info!(task_id = id, %description, "Submitted task"),
            Err(err) => warn!(error = %err, %description, "Task rejected"),
        }
    }

    coordinator.drain_and_shutdown().await;

    println!("Final task statuses:");
    for (id, entry) in coordinator.store().snapshot() {
        println!("  Task #{id}: {}", entry.status);
    }

    let unroutable = coordinator.unroutable(usize::MAX);
    if !unroutable.is_empty() {
        println!("Unroutable tasks:");
        for letter in unroutable {
            println!(
                "  Task #{} ({}): {}",
                letter.task.id, letter.task.required_role, letter.reason
            );
        }
    }

    Ok(())
}
