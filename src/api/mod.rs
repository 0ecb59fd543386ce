//! Intake Relay HTTP Surface
//!
//! HTTP layer around the relay, built with Axum.
//!
//! # Endpoints
//!
//! ## Health
//! - `GET /health/live` - Liveness check
//! - `GET /health` - Status with the number of connected clients
//!
//! ## WebSocket
//! - `GET /ws` - Relay connection
//!
//! # Example
//!
//! ```rust,ignore
//! use intake_relay::api::{serve, AppState};
//! use intake_relay::config::ServerConfig;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig::default();
//!     serve(AppState::new(config.clone()), &config).await?;
//!     Ok(())
//! }
//! ```

pub mod dto;
pub mod error;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use state::AppState;

use axum::{http::Method, routing::get, Router};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::ServerConfig;
use crate::websocket::websocket_handler;

/// Build the router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    let health_routes = Router::new()
        .route("/live", get(routes::health::liveness))
        .route("/", get(routes::health::health));

    let shared_state = Arc::new(state);

    Router::new()
        .route("/ws", get(websocket_handler))
        .nest("/health", health_routes)
        .fallback(routes::health::not_found)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer())
        .with_state(shared_state)
}

/// Open CORS for the HTTP routes; the origin allow-list guards only `/ws`
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
}

/// Start the server
pub async fn serve(state: AppState, config: &ServerConfig) -> ApiResult<()> {
    let router = build_router(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Intake relay listening on {}", addr);
    tracing::info!("Health check: http://{}/health", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ApiError::Internal(format!("Server error: {}", e)))?;

    tracing::info!("Intake relay shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
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
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
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

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use tokio::sync::mpsc;
    use tower::util::ServiceExt;

    fn create_test_app() -> (Router, Arc<crate::websocket::EventRouter>) {
        let state = AppState::new(ServerConfig::default());
        let relay = Arc::clone(&state.router);
        (build_router(state), relay)
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_live() {
        let (app, _) = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health/live")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health_reports_connected_clients() {
        let (app, relay) = create_test_app();
        let (tx1, _rx1) = mpsc::unbounded_channel();
        let (tx2, _rx2) = mpsc::unbounded_channel();
        relay.connect(tx1).await.unwrap();
        relay.connect(tx2).await.unwrap();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "OK");
        assert_eq!(json["connectedClients"], 2);
        assert!(json["timestamp"].is_string());
    }

    #[tokio::test]
    async fn test_unknown_route_returns_json_error() {
        let (app, _) = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/nothing")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_cors_is_open_for_http_routes() {
        for origin in ["http://localhost:3000", "https://elsewhere.example"] {
            let (app, _) = create_test_app();

            let response = app
                .oneshot(
                    Request::builder()
                        .uri("/health")
                        .header(header::ORIGIN, origin)
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(
                response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
                "*"
            );
        }
    }

    #[tokio::test]
    async fn test_ws_rejects_foreign_origin() {
        let (app, _) = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/ws")
                    .header(header::ORIGIN, "https://evil.example")
                    .header(header::CONNECTION, "upgrade")
                    .header(header::UPGRADE, "websocket")
                    .header(header::SEC_WEBSOCKET_VERSION, "13")
                    .header(header::SEC_WEBSOCKET_KEY, "dGhlIHNhbXBsZSBub25jZQ==")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
