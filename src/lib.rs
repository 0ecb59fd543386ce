//! # Intake Relay
//!
//! Real-time relay that lets one patient client and any number of staff
//! observers share live intake form state over WebSocket.
//!
//! ## Features
//!
//! - **Role tracking**: each connection identifies as patient or staff in-band
//! - **Fan-out**: form edits, submissions, typing indicators and presence
//!   changes reach every connection except the sender
//! - **Role gates**: only patients can publish form edits and typing indicators
//! - **Health endpoint**: live connection count for monitoring
//!
//! ## Modules
//!
//! - [`websocket`]: Connection registry, event router and socket handling
//! - [`api`]: HTTP server with Axum
//! - [`config`]: TOML and environment configuration
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use intake_relay::{ClientEvent, EventRouter};
//! use tokio::sync::mpsc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let router = EventRouter::new();
//!
//!     let (patient_tx, _patient_rx) = mpsc::unbounded_channel();
//!     let (staff_tx, mut staff_rx) = mpsc::unbounded_channel();
//!     let patient = router.connect(patient_tx).await?;
//!     let staff = router.connect(staff_tx).await?;
//!
//!     router.dispatch(&staff, ClientEvent::StaffConnected).await;
//!     router
//!         .dispatch(&patient, ClientEvent::TypingStart { field: "name".into() })
//!         .await;
//!
//!     // Nothing yet: the patient has not identified itself
//!     assert!(staff_rx.try_recv().is_err());
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod websocket;

pub use api::{build_router, serve, ApiError, ApiResult, AppState};

pub use websocket::{
    websocket_handler, ClientEvent, Connection, ConnectionId, ConnectionRegistry, EventRouter,
    Outlet, RegistryError, Role, ServerEvent,
};

pub use config::{Config, ConfigError, LoggingConfig, ServerConfig};
