//! Data Transfer Objects
//!
//! Response types for the HTTP endpoints.

use serde::Serialize;

/// Health check response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// Always "OK" while the process serves requests
    pub status: String,
    /// Live relay connections, identified or not
    pub connected_clients: usize,
    /// Server time, ISO-8601
    pub timestamp: String,
}
