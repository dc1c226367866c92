//! Watchtower Relay - registry webhook receiver.
//!
//! This binary:
//! - Receives push webhooks on `/api/webhooks/{id}`
//! - Verifies the webhook identifier
//! - Responds immediately
//! - Forwards accepted payloads to Watchtower after `DELAY_SECONDS`
//!
//! On shutdown, in-flight deliveries are drained before the process exits.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use tokio::{net::TcpListener, signal};
use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use watchtower_relay::{router, AppState, Config, Forwarder, Relay};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize structured JSON logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true))
        .init();

    info!("relay_starting");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    info!(
        port = config.port,
        watchtower_url = %config.watchtower_url,
        update_url = %config.update_url(),
        watch_only_for_latest_tag = config.watch_only_for_latest_tag,
        delay_seconds = config.delay.as_secs(),
        max_body_bytes = config.max_body_bytes,
        "config_loaded"
    );

    let relay = Relay::new(&config).context("Failed to create Watchtower relay")?;
    let forwarder = Forwarder::new(relay, config.delay);

    let port = config.port;
    let webhook_path = format!("/api/webhooks/{}", config.webhook_id);
    let app = router(AppState::new(config, forwarder.clone()));

    // Bind to address
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!(address = %addr, webhook_path = %webhook_path, "relay_listening");

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // Let scheduled deliveries finish
    forwarder.drain().await;

    info!("relay_shutdown_complete");

    Ok(())
}

/// Resolve on SIGINT or SIGTERM. A handler that cannot be installed never fires.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(signal = "SIGINT", error = %e, "signal_handler_failed");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(signal = "SIGTERM", error = %e, "signal_handler_failed");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let received = tokio::select! {
        _ = ctrl_c => "SIGINT",
        _ = terminate => "SIGTERM",
    };

    info!(signal = received, "relay_shutting_down");
}
