//! Health Routes
//!
//! - GET /health/live - Liveness check (process is alive)
//! - GET /health - Status with the live connection count

use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::api::dto::HealthResponse;
use crate::api::error::ApiError;
use crate::api::state::AppState;
use crate::websocket::iso_now;

/// GET /health/live
///
/// Returns 200 if the process is alive, no dependency checks.
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

/// GET /health
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK".to_string(),
        connected_clients: state.connected_clients().await,
        timestamp: iso_now(),
    })
}

/// Fallback for unmatched routes
pub async fn not_found(uri: axum::http::Uri) -> ApiError {
    ApiError::NotFound(uri.path().to_string())
}
