//! # Hotelier Daemon
//!
//! Delivers reservation confirmations queued by committed bookings.
//!
//! ## Usage
//! ```bash
//! hotelier-daemon                          # default config location
//! hotelier-daemon --config ./hotelier.toml
//! RUST_LOG=hotelier_engine=debug hotelier-daemon
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use hotelier_db::{Database, DbConfig};
use hotelier_engine::{EngineConfig, LogNotifier, NotificationDispatcher, Notifier, WebhookNotifier};

const CLEANUP_INTERVAL: Duration = Duration::from_secs(60 * 60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .init();

    info!("Starting Hotelier daemon...");

    let config = EngineConfig::load(config_path_arg()).context("loading configuration")?;
    info!(
        db = %config.database.path.display(),
        webhook = config.notifications.webhook_url.is_some(),
        poll_secs = config.notifications.poll_interval_secs,
        "Configuration loaded"
    );

    let db = Database::new(
        DbConfig::new(&config.database.path).max_connections(config.database.max_connections),
    )
    .await
    .context("opening database")?;

    let pending = db.notifications().count_pending().await?;
    info!(pending, "Database ready");

    let notifier: Arc<dyn Notifier> = match &config.notifications.webhook_url {
        Some(url) => Arc::new(WebhookNotifier::new(
            url.clone(),
            config.notifications.webhook_timeout(),
        )?),
        None => {
            warn!("No webhook_url configured, confirmations will only be logged");
            Arc::new(LogNotifier)
        }
    };

    let (dispatcher, handle) =
        NotificationDispatcher::new(db.clone(), notifier, config.notifications.clone());
    let dispatcher_task = tokio::spawn(dispatcher.run());

    let cleanup_task = tokio::spawn(cleanup_loop(db.clone(), config.notifications.cleanup_after_days));

    shutdown_signal().await;

    handle.shutdown().await;
    if let Err(e) = dispatcher_task.await {
        error!(error = %e, "Dispatcher task failed");
    }
    cleanup_task.abort();

    db.close().await;
    info!("Daemon shutdown complete");
    Ok(())
}

/// `--config <PATH>` / `-c <PATH>`.
fn config_path_arg() -> Option<PathBuf> {
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config" || arg == "-c" {
            return args.next().map(PathBuf::from);
        }
    }
    None
}

/// Purges delivered outbox entries once an hour.
async fn cleanup_loop(db: Database, days: u32) {
    let mut interval = tokio::time::interval(CLEANUP_INTERVAL);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        interval.tick().await;
        match db.notifications().cleanup_old_entries(days).await {
            Ok(0) => {}
            Ok(removed) => info!(removed, days, "Purged delivered notifications"),
            Err(e) => error!(error = %e, "Outbox cleanup failed"),
        }
    }
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
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

    info!("Shutdown signal received, starting graceful shutdown...");
}
