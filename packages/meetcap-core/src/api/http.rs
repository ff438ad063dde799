//! HTTP route handlers.
//!
//! All handlers are thin - they delegate to services for business logic.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use serde_json::json;

use crate::api::response::{api_error, api_success};
use crate::api::ws::ws_handler;
use crate::api::AppState;
use crate::protocol_constants::SERVICE_ID;

/// Builds the application router: liveness/readiness probes and the
/// WebSocket ingestion endpoint (§4.8).
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .route("/ws", get(ws_handler))
        .with_state(state)
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// Liveness probe: "Is the process running?"
///
/// Always returns 200 OK if the server is responding. Use `/ready` for
/// readiness checks that verify the service can handle requests.
async fn health_check(axum::extract::State(state): axum::extract::State<AppState>) -> impl IntoResponse {
    api_success(json!({
        "status": "ok",
        "service": SERVICE_ID,
        "liveSessions": state.registry.session_count(),
    }))
}

/// Readiness probe: "Can the service handle requests?"
///
/// Returns 200 OK only when the recordings root is reachable on disk.
async fn readiness_check(axum::extract::State(state): axum::extract::State<AppState>) -> Response {
    let ready = tokio::fs::metadata(&state.recordings_root)
        .await
        .map(|m| m.is_dir())
        .unwrap_or(false);

    if ready {
        api_success(json!({
            "status": "ready",
            "ready": true,
            "recordingsRoot": state.recordings_root.display().to_string(),
        }))
        .into_response()
    } else {
        api_error(
            StatusCode::SERVICE_UNAVAILABLE,
            "recordings_root_unreachable",
            format!(
                "recordings root {} is missing or not a directory",
                state.recordings_root.display()
            ),
        )
        .into_response()
    }
}
