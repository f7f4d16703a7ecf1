//! Web server module for receiving KumoMTA webhooks.

pub mod handlers;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

pub use handlers::{health, kumomta_webhook, AppState, HealthResponse};

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let config = state.config.clone();

    Router::new()
        .route("/health", get(health))
        .route(&config.webhook_path, post(kumomta_webhook))
        .layer(DefaultBodyLimit::max(config.max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
