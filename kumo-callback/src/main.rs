//! KumoMTA callback web server.
//!
//! Receives KumoMTA feedback-loop webhooks and hands permanent failures to
//! the host application's Do-Not-Contact queue.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::{net::TcpListener, signal};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use kumo_callback::web::router;
use kumo_callback::{AppState, Config, Publisher};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize structured JSON logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true))
        .init();

    info!("web_server_starting");

    let config = Config::from_env();
    info!(
        port = config.port,
        cloudamqp_url_set = !config.cloudamqp_url.is_empty(),
        suppression_queue = %config.suppression_queue,
        webhook_path = %config.webhook_path,
        max_body_bytes = config.max_body_bytes,
        "config_loaded"
    );

    // Connects lazily on the first suppressed recipient
    let publisher = Publisher::new(
        config.cloudamqp_url.clone(),
        config.suppression_queue.clone(),
    );
    info!("rabbitmq_publisher_created");

    let state = AppState::new(config.clone(), Arc::new(publisher.clone()));
    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!(address = %addr, "web_server_listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    publisher.close().await;

    info!("web_server_shutdown_complete");

    Ok(())
}

/// Create a future that completes when a shutdown signal is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }

    info!("web_server_shutting_down");
}
