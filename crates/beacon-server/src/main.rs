//! Beacon daemon.
//!
//! Runs the record store, the expiry sweeper, the webhook relay, and
//! the HTTP API in one process.
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Load configuration from the environment (and `.env`)
//! 3. Create the record store
//! 4. Start the expiry sweeper (first sweep runs immediately)
//! 5. Build the webhook notifier
//! 6. Serve HTTP until Ctrl-C or SIGTERM
//! 7. Stop the sweeper and exit

mod config;
mod error;

use std::sync::Arc;

use beacon_api::{AppState, start_server};
use beacon_core::{RecordStore, Sweeper};
use beacon_relay::Notifier;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::DaemonConfig;
use crate::error::DaemonError;

#[tokio::main]
async fn main() -> Result<(), DaemonError> {
    // 1. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("beacon-server starting");

    // 2. Load configuration.
    let config = DaemonConfig::load()?;
    info!(
        ttl_ms = config.store.ttl.as_millis(),
        sweep_interval_ms = config.store.sweep_interval.as_millis(),
        host = config.server.host,
        port = config.server.port,
        rate_limit_max = config.rate_limit.max_requests,
        "Configuration loaded"
    );
    if config.auth.api_key.is_none() {
        warn!("API_KEY is not set; every protected request will be rejected");
    }
    if config.relay.webhook_url.is_none() {
        warn!("DISCORD_WEBHOOK_URL is not set; notifications are disabled");
    }

    // 3. Create the store.
    let store = Arc::new(RecordStore::new(&config.store));

    // 4. Start the sweeper.
    let sweeper = Sweeper::start(Arc::clone(&store), config.store.sweep_interval);

    // 5. Build the notifier.
    let notifier = Arc::new(Notifier::new(&config.relay)?);

    // 6. Serve until a termination signal arrives.
    let state = Arc::new(AppState::new(
        store,
        notifier,
        config.auth,
        config.rate_limit,
    ));
    let served = start_server(&config.server, state, shutdown_signal()).await;

    // 7. Stop the sweeper whether or not serving succeeded.
    sweeper.shutdown().await;
    served?;

    info!("beacon-server stopped");
    Ok(())
}

/// Resolves on Ctrl-C, or on SIGTERM where supported.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl-C");
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
                warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }

    info!("shutdown signal received");
}
