//! Application State
//!
//! Shared state accessible by all HTTP and WebSocket handlers.
//! Wrapped in Arc for thread-safe sharing across async tasks.

use crate::config::ServerConfig;
use crate::websocket::EventRouter;
use std::sync::Arc;

/// Shared application state for all handlers
#[derive(Clone)]
pub struct AppState {
    /// Event router owning the connection registry
    pub router: Arc<EventRouter>,
    /// Server configuration
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            router: Arc::new(EventRouter::new()),
            config: Arc::new(config),
        }
    }

    /// Number of live relay connections
    pub async fn connected_clients(&self) -> usize {
        self.router.connection_count().await
    }
}
