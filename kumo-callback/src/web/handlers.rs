//! Webhook endpoint handlers.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::info;

use crate::process::{handle_webhook, Outcome};
use crate::suppression::SuppressionList;
use crate::Config;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub suppression: Arc<dyn SuppressionList>,
}

impl AppState {
    pub fn new(config: Config, suppression: Arc<dyn SuppressionList>) -> Self {
        Self {
            config: Arc::new(config),
            suppression,
        }
    }
}

// =============================================================================
// Health Check
// =============================================================================

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

// =============================================================================
// KumoMTA Webhook
// =============================================================================

impl IntoResponse for Outcome {
    fn into_response(self) -> Response {
        let status = match self {
            Outcome::Ok(_) => StatusCode::OK,
            Outcome::BadRequest(_) => StatusCode::BAD_REQUEST,
        };

        (status, self.body()).into_response()
    }
}

/// KumoMTA feedback webhook endpoint.
///
/// The body is read as raw bytes so that malformed JSON gets the webhook's
/// own "Invalid JSON" answer instead of axum's extractor rejection.
pub async fn kumomta_webhook(State(state): State<AppState>, body: Bytes) -> Outcome {
    info!(body_length = body.len(), "kumomta_webhook_received");

    handle_webhook(&body, state.suppression.as_ref()).await
}
