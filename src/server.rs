use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use taskserver::api::{self, state::AppState};
use taskserver::config::Config;
use taskserver::queue::{Coordinator, CoordinatorOptions};

use crate::cli::ServerArgs;

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub async fn run(args: ServerArgs) -> Result<(), AnyError> {
    let mut config = Config::load()?;
    if let Some(address) = args.address {
        config.server.bind_addr = address;
    }

    let coordinator = Arc::new(Coordinator::start(CoordinatorOptions::from_config(&config)));
    let listener = TcpListener::bind(config.server.bind_addr).await?;
    let state = AppState::new(config, coordinator.clone());

    api::serve(listener, state, shutdown_signal()).await?;

    let counts = coordinator.store().counts();
    info!(
        pending = counts.pending,
        done = counts.done,
        "Task server shut down"
    );

    Ok(())
}

async fn shutdown_signal() {
    // Wait for Ctrl+C
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
