//! Event Router
//!
//! Translates one inbound [`ClientEvent`] into zero or more outbound
//! [`ServerEvent`]s. Fan-out is always "everyone but the sender": an explicit
//! walk over the registry that skips the originating connection.
//!
//! The registry and the per-connection outlets live behind a single lock, so
//! each event sees and leaves a consistent view.

use serde_json::{Map, Value};
use std::collections::HashMap;
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

use super::messages::{ClientEvent, ServerEvent};
use super::registry::{Connection, ConnectionId, ConnectionRegistry, RegistryError, Role};

/// Channel sender for one connection's outbound events
pub type Outlet = mpsc::UnboundedSender<ServerEvent>;

/// Registry plus the outlets needed to reach each registered connection
#[derive(Default)]
struct RelayState {
    registry: ConnectionRegistry,
    outlets: HashMap<ConnectionId, Outlet>,
}

impl RelayState {
    /// Send to every connection except `sender`. Closed outlets are skipped.
    fn broadcast_except(&self, sender: &str, event: ServerEvent) -> usize {
        let mut delivered = 0;
        for id in self.registry.ids_except(sender) {
            if let Some(outlet) = self.outlets.get(id) {
                if outlet.send(event.clone()).is_ok() {
                    delivered += 1;
                }
            }
        }

        tracing::trace!(
            connection_id = %sender,
            event = event.name(),
            delivered,
            "Broadcast event"
        );
        delivered
    }

    fn send_to(&self, id: &str, event: ServerEvent) -> bool {
        self.outlets
            .get(id)
            .map(|outlet| outlet.send(event).is_ok())
            .unwrap_or(false)
    }

    fn role_of(&self, id: &str) -> Option<Role> {
        self.registry.get(id).map(|c| c.role)
    }
}

/// Owns the connection registry and routes events between connections
#[derive(Default)]
pub struct EventRouter {
    state: RwLock<RelayState>,
}

impl EventRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new connection under a freshly generated id.
    pub async fn connect(&self, outlet: Outlet) -> Result<ConnectionId, RegistryError> {
        let id = Uuid::new_v4().to_string();
        self.attach(id.clone(), outlet).await?;
        Ok(id)
    }

    /// Register a connection under a transport-assigned id.
    pub async fn attach(&self, id: ConnectionId, outlet: Outlet) -> Result<(), RegistryError> {
        let mut state = self.state.write().await;
        state.registry.register(id.clone())?;
        state.outlets.insert(id.clone(), outlet);

        tracing::info!(
            connection_id = %id,
            connected = state.registry.size(),
            "Client connected"
        );
        Ok(())
    }

    /// Handle one inbound event from `id` to completion.
    pub async fn dispatch(&self, id: &str, event: ClientEvent) {
        match event {
            ClientEvent::PatientConnected { data } => self.on_patient_connected(id, data).await,
            ClientEvent::StaffConnected => self.on_staff_connected(id).await,
            ClientEvent::FormUpdate { data } => {
                self.relay_from_patient(id, |id| ServerEvent::form_updated(id, data))
                    .await
            }
            ClientEvent::FormSubmitted { form_data } => self.on_form_submitted(id, form_data).await,
            ClientEvent::TypingStart { field } => {
                self.relay_from_patient(id, |id| ServerEvent::patient_typing(id, field, true))
                    .await
            }
            ClientEvent::TypingStop { field } => {
                self.relay_from_patient(id, |id| ServerEvent::patient_typing(id, field, false))
                    .await
            }
            ClientEvent::Ping { ack } => self.on_ping(id, ack).await,
        }
    }

    /// Remove a connection, telling everyone else if it was a patient.
    pub async fn disconnect(&self, id: &str) {
        let mut state = self.state.write().await;
        state.outlets.remove(id);

        let Some(connection) = state.registry.remove(id) else {
            return;
        };

        if connection.is_patient() {
            state.broadcast_except(id, ServerEvent::patient_disconnected(id));
        }

        tracing::info!(
            connection_id = %id,
            role = ?connection.role,
            remaining = state.registry.size(),
            "Client disconnected"
        );
    }

    pub async fn connection_count(&self) -> usize {
        self.state.read().await.registry.size()
    }

    /// Snapshot of one connection's metadata
    pub async fn connection(&self, id: &str) -> Option<Connection> {
        self.state.read().await.registry.get(id).cloned()
    }

    async fn on_patient_connected(&self, id: &str, data: Map<String, Value>) {
        let mut state = self.state.write().await;
        if let Err(e) = state.registry.identify_as_patient(id, data.clone()) {
            tracing::debug!(connection_id = %id, error = %e, "Ignoring patient identification");
            return;
        }

        tracing::info!(
            connection_id = %id,
            patients = state.registry.count_by_role(Role::Patient),
            "Patient registered"
        );
        state.broadcast_except(id, ServerEvent::patient_connected(id, data));
    }

    async fn on_staff_connected(&self, id: &str) {
        let mut state = self.state.write().await;
        if let Err(e) = state.registry.identify_as_staff(id) {
            tracing::debug!(connection_id = %id, error = %e, "Ignoring staff identification");
            return;
        }

        tracing::info!(
            connection_id = %id,
            staff = state.registry.count_by_role(Role::Staff),
            "Staff registered"
        );
    }

    /// Submissions are accepted from any registered connection, whatever its role.
    async fn on_form_submitted(&self, id: &str, form_data: Value) {
        let state = self.state.read().await;
        if state.registry.get(id).is_none() {
            return;
        }

        tracing::info!(connection_id = %id, "Form submitted");
        state.broadcast_except(id, ServerEvent::form_submitted(id, form_data));
    }

    /// Broadcast an event built for `id` only if `id` is a patient.
    async fn relay_from_patient<F>(&self, id: &str, build: F)
    where
        F: FnOnce(&str) -> ServerEvent,
    {
        let state = self.state.read().await;
        match state.role_of(id) {
            Some(Role::Patient) => {
                let event = build(id);
                tracing::debug!(connection_id = %id, event = event.name(), "Patient activity");
                state.broadcast_except(id, event);
            }
            role => {
                tracing::debug!(connection_id = %id, role = ?role, "Dropping non-patient activity");
            }
        }
    }

    async fn on_ping(&self, id: &str, ack: Option<u64>) {
        let Some(ack) = ack else {
            return;
        };
        self.state.read().await.send_to(id, ServerEvent::pong(ack));
    }
}
