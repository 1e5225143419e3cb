//! Campus Wall event service
//!
//! Main application entry point

use std::time::Duration;

use anyhow::Context;
use tokio::{net::TcpListener, sync::watch};
use tracing::{info, warn};

use campus_wall::{
    config::Settings,
    database::DatabaseService,
    router, shutdown_signal,
    state::AppState,
    utils::logging,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // Load configuration
    let settings = Settings::new().context("failed to load configuration")?;
    settings.validate().context("invalid configuration")?;

    // Initialize logging; the guard flushes the file writer on exit
    let _log_guard = logging::init_logging(&settings.logging)?;

    info!("Starting {}...", campus_wall::info());

    info!("Connecting to database...");
    let database = DatabaseService::connect(&settings).await?;

    info!("Initializing services...");
    let state = AppState::new(settings.clone(), database)?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let flusher = if state.services.view_counter.is_buffered() {
        let interval = Duration::from_secs(settings.redis.flush_interval_seconds);
        Some(state.services.view_counter.clone().spawn_flusher(interval, shutdown_rx))
    } else {
        None
    };

    let app = router(state);

    let address = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {}", address))?;
    info!("Server running on {}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = flusher {
        info!("Server stopped, flushing buffered view counts...");
        if shutdown_tx.send(true).is_err() {
            warn!("View count flusher already stopped");
        }
        handle.await?;
    }

    info!("Shutdown complete");
    Ok(())
}
