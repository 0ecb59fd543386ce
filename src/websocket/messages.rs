//! Relay Message Types
//!
//! Every frame is a JSON object whose `event` key names the event; the
//! remaining keys are the payload.
//!
//! ```json
//! {"event": "form_update", "field": "name", "value": "Jo"}
//! {"event": "form_updated", "patientId": "…", "field": "name", "value": "Jo", "timestamp": "…"}
//! ```

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::registry::ConnectionId;

/// Keys the server assigns on `patient_connected`; client data never overrides them.
const PATIENT_CONNECTED_KEYS: &[&str] = &["event", "patientId"];

/// Keys the server assigns on `form_updated`.
const FORM_UPDATED_KEYS: &[&str] = &["event", "patientId", "timestamp"];

/// Events sent from client to server
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ClientEvent {
    /// The patient identifies itself, carrying arbitrary patient details
    PatientConnected {
        #[serde(flatten)]
        data: Map<String, Value>,
    },
    /// A staff observer identifies itself
    StaffConnected,
    /// Live edit of one or more form fields
    FormUpdate {
        #[serde(flatten)]
        data: Map<String, Value>,
    },
    /// Final form submission
    FormSubmitted {
        #[serde(rename = "formData", default)]
        form_data: Value,
    },
    /// The patient started typing in a field
    TypingStart { field: String },
    /// The patient stopped typing in a field
    TypingStop { field: String },
    /// Keepalive; answered only when `ack` is present
    Ping {
        #[serde(default)]
        ack: Option<u64>,
    },
}

impl ClientEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ClientEvent::PatientConnected { .. } => "patient_connected",
            ClientEvent::StaffConnected => "staff_connected",
            ClientEvent::FormUpdate { .. } => "form_update",
            ClientEvent::FormSubmitted { .. } => "form_submitted",
            ClientEvent::TypingStart { .. } => "typing_start",
            ClientEvent::TypingStop { .. } => "typing_stop",
            ClientEvent::Ping { .. } => "ping",
        }
    }
}

/// Events sent from server to client
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ServerEvent {
    /// A patient joined (or re-identified)
    #[serde(rename_all = "camelCase")]
    PatientConnected {
        patient_id: ConnectionId,
        #[serde(flatten)]
        data: Map<String, Value>,
    },
    /// A patient edited the form
    #[serde(rename_all = "camelCase")]
    FormUpdated {
        patient_id: ConnectionId,
        #[serde(flatten)]
        data: Map<String, Value>,
        timestamp: String,
    },
    /// A form was submitted
    #[serde(rename_all = "camelCase")]
    FormSubmitted {
        patient_id: ConnectionId,
        form_data: Value,
        submitted_at: String,
    },
    /// Typing indicator for a patient field
    #[serde(rename_all = "camelCase")]
    PatientTyping {
        patient_id: ConnectionId,
        field: String,
        is_typing: bool,
    },
    /// A patient's connection closed
    #[serde(rename_all = "camelCase")]
    PatientDisconnected { patient_id: ConnectionId },
    /// Reply to a ping, addressed only to the caller
    Ack {
        ack: u64,
        status: String,
        timestamp: String,
    },
}

impl ServerEvent {
    pub fn patient_connected(patient_id: &str, data: Map<String, Value>) -> Self {
        ServerEvent::PatientConnected {
            patient_id: patient_id.to_string(),
            data: without_keys(data, PATIENT_CONNECTED_KEYS),
        }
    }

    pub fn form_updated(patient_id: &str, data: Map<String, Value>) -> Self {
        ServerEvent::FormUpdated {
            patient_id: patient_id.to_string(),
            data: without_keys(data, FORM_UPDATED_KEYS),
            timestamp: iso_now(),
        }
    }

    pub fn form_submitted(patient_id: &str, form_data: Value) -> Self {
        ServerEvent::FormSubmitted {
            patient_id: patient_id.to_string(),
            form_data,
            submitted_at: iso_now(),
        }
    }

    pub fn patient_typing(patient_id: &str, field: String, is_typing: bool) -> Self {
        ServerEvent::PatientTyping {
            patient_id: patient_id.to_string(),
            field,
            is_typing,
        }
    }

    pub fn patient_disconnected(patient_id: &str) -> Self {
        ServerEvent::PatientDisconnected {
            patient_id: patient_id.to_string(),
        }
    }

    pub fn pong(ack: u64) -> Self {
        ServerEvent::Ack {
            ack,
            status: "pong".to_string(),
            timestamp: iso_now(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ServerEvent::PatientConnected { .. } => "patient_connected",
            ServerEvent::FormUpdated { .. } => "form_updated",
            ServerEvent::FormSubmitted { .. } => "form_submitted",
            ServerEvent::PatientTyping { .. } => "patient_typing",
            ServerEvent::PatientDisconnected { .. } => "patient_disconnected",
            ServerEvent::Ack { .. } => "ack",
        }
    }
}

/// Current time as an ISO-8601 UTC string with millisecond precision
pub fn iso_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn without_keys(mut data: Map<String, Value>, reserved: &[&str]) -> Map<String, Value> {
    for key in reserved {
        data.remove(*key);
    }
    data
}
