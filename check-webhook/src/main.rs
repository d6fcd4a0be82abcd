//! Check Webhook server.
//!
//! Listens for signed webhook deliveries on `POST /webhook` and acknowledges
//! the authentic ones.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use secrecy::ExposeSecret;
use tokio::{net::TcpListener, signal};
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use check_webhook::{router, AppState, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize structured JSON logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true))
        .init();

    info!("webhook_receiver_starting");

    // Load configuration; a missing WEBHOOK_TOKEN aborts startup
    let config = Config::from_env().context("Failed to load configuration")?;
    info!(
        port = config.port,
        webhook_token_length = config.webhook_token.expose_secret().len(),
        body_mode = config.body_mode.as_str(),
        max_body_bytes = config.max_body_bytes,
        "config_loaded"
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let app = router(AppState::new(config));

    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!(address = %addr, "webhook_receiver_listening");

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("webhook_receiver_stopped");

    Ok(())
}

/// Resolve once SIGINT or SIGTERM arrives.
///
/// If a handler cannot be installed that signal is ignored and the server
/// keeps running until the other one fires.
async fn shutdown_signal() {
    let interrupt = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, signal = "SIGINT", "shutdown_handler_unavailable");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!(error = %e, signal = "SIGTERM", "shutdown_handler_unavailable");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let received = tokio::select! {
        _ = interrupt => "SIGINT",
        _ = terminate => "SIGTERM",
    };

    info!(signal = received, "webhook_receiver_draining");
}
