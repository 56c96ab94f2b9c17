//! Marquee Event API
//!
//! Serves the event collection and its scoped routes, and owns the
//! publication state machine. Background export and image tasks are queued
//! here and drained by the worker fleet.

use anyhow::{Context, Result};
use marquee_api::{
    api, config,
    db::Database,
    jobs::{JobSweeper, JobSweeperConfig},
    state::AppState,
};
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// RUST_LOG wins over MARQUEE_LOG_LEVEL.
fn init_tracing(default_level: &str) {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()))
        .with(tracing_subscriber::fmt::layer().json())
        .init();
}

async fn wait_for_shutdown(mut shutdown_rx: watch::Receiver<bool>) {
    while !*shutdown_rx.borrow() {
        if shutdown_rx.changed().await.is_err() {
            break;
        }
    }
    info!("HTTP server shutting down");
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = config::Config::from_env()?;
    init_tracing(&config.log_level);

    info!(listen_addr = %config.listen_addr, "Starting marquee-api");

    let db = Database::connect(&config.database)
        .await
        .context("database connection failed")?;

    if config.dev_mode {
        info!("Dev mode: applying migrations");
        db.run_migrations().await.context("migrations failed")?;
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let sweeper = JobSweeper::new(db.pool().clone(), JobSweeperConfig::default());
    let sweeper_handle = tokio::spawn({
        let shutdown_rx = shutdown_rx.clone();
        async move { sweeper.run(shutdown_rx).await }
    });

    let app = api::create_router(AppState::new(db));
    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    info!(addr = %config.listen_addr, "Listening for connections");

    let server_handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(wait_for_shutdown(shutdown_rx))
            .await
    });

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal");
        }
        result = server_handle => {
            match result {
                Ok(Ok(())) => info!("Server exited normally"),
                Ok(Err(e)) => error!(error = %e, "Server error"),
                Err(e) => error!(error = %e, "Server task panicked"),
            }
        }
    }

    let _ = shutdown_tx.send(true);
    if tokio::time::timeout(std::time::Duration::from_secs(10), sweeper_handle)
        .await
        .is_err()
    {
        warn!("Job sweeper did not shut down in time");
    }

    info!("Shutdown complete");
    Ok(())
}
