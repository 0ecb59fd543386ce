//! Connection Registry
//!
//! In-memory table of live connections and the role each one has claimed.
//! Pure data: no channels, no I/O. The [`EventRouter`](super::EventRouter)
//! owns the only instance and serializes access to it.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use thiserror::Error;

/// Unique identifier for a relay connection
pub type ConnectionId = String;

/// Functional category of a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Connected but not yet identified
    Unknown,
    /// The patient filling in the form
    Patient,
    /// A staff member observing patients
    Staff,
}

/// Metadata for one live transport session
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub id: ConnectionId,
    pub role: Role,
    pub connected_at: DateTime<Utc>,
    /// Set only while `role` is [`Role::Patient`]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient_data: Option<Map<String, Value>>,
}

impl Connection {
    fn new(id: ConnectionId) -> Self {
        Self {
            id,
            role: Role::Unknown,
            connected_at: Utc::now(),
            patient_data: None,
        }
    }

    pub fn is_patient(&self) -> bool {
        self.role == Role::Patient
    }
}

/// Process-lifetime mapping of connection id to [`Connection`]
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: HashMap<ConnectionId, Connection>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a fresh `unknown` entry.
    ///
    /// A duplicate id means the transport handed out the same id twice while
    /// the first session is still alive; callers must not continue with it.
    pub fn register(&mut self, id: impl Into<ConnectionId>) -> Result<&Connection, RegistryError> {
        let id = id.into();
        if self.connections.contains_key(&id) {
            return Err(RegistryError::DuplicateConnection(id));
        }

        let connection = self
            .connections
            .entry(id.clone())
            .or_insert_with(|| Connection::new(id));
        Ok(connection)
    }

    /// Mark a connection as the patient and attach its data.
    ///
    /// Re-identification overwrites the previous data.
    pub fn identify_as_patient(
        &mut self,
        id: &str,
        patient_data: Map<String, Value>,
    ) -> Result<&Connection, RegistryError> {
        let connection = self
            .connections
            .get_mut(id)
            .ok_or_else(|| RegistryError::ConnectionNotFound(id.to_string()))?;

        connection.role = Role::Patient;
        connection.patient_data = Some(patient_data);
        Ok(connection)
    }

    /// Mark a connection as staff.
    pub fn identify_as_staff(&mut self, id: &str) -> Result<&Connection, RegistryError> {
        let connection = self
            .connections
            .get_mut(id)
            .ok_or_else(|| RegistryError::ConnectionNotFound(id.to_string()))?;

        connection.role = Role::Staff;
        connection.patient_data = None;
        Ok(connection)
    }

    pub fn get(&self, id: &str) -> Option<&Connection> {
        self.connections.get(id)
    }

    /// Delete an entry. Removing an absent id is a no-op.
    pub fn remove(&mut self, id: &str) -> Option<Connection> {
        self.connections.remove(id)
    }

    pub fn size(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Every registered id except `sender`: the broadcast audience.
    pub fn ids_except<'a>(&'a self, sender: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.connections
            .keys()
            .map(String::as_str)
            .filter(move |id| *id != sender)
    }

    pub fn count_by_role(&self, role: Role) -> usize {
        self.connections.values().filter(|c| c.role == role).count()
    }
}

/// Errors raised by registry lifecycle operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Connection {0} is already registered")]
    DuplicateConnection(ConnectionId),

    #[error("Connection {0} not found")]
    ConnectionNotFound(ConnectionId),
}
