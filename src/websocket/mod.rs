//! WebSocket Relay
//!
//! Shares live intake form state between one patient and any number of staff
//! observers.
//!
//! ## Architecture
//!
//! - **ConnectionRegistry**: Live connections and the role each has claimed
//! - **EventRouter**: Applies role gates and fans events out to everyone but the sender
//! - **Handler**: Handles WebSocket upgrade and frame processing
//! - **Messages**: Defines client and server event formats
//!
//! ## Events
//!
//! | Client sends          | Others receive         | Only from a patient |
//! |-----------------------|------------------------|---------------------|
//! | `patient_connected`   | `patient_connected`    | no                  |
//! | `staff_connected`     | nothing                | no                  |
//! | `form_update`         | `form_updated`         | yes                 |
//! | `form_submitted`      | `form_submitted`       | no                  |
//! | `typing_start`/`stop` | `patient_typing`       | yes                 |
//! | `ping` with `ack`     | (caller gets `ack`)    | no                  |
//! | close                 | `patient_disconnected` | yes                 |
//!
//! ## Example
//!
//! ```javascript
//! const ws = new WebSocket('ws://localhost:3001/ws');
//!
//! ws.onopen = () => {
//!   ws.send(JSON.stringify({event: 'patient_connected', name: 'Jo'}));
//!   ws.send(JSON.stringify({event: 'form_update', field: 'name', value: 'Jo'}));
//! };
//! ```

mod handler;
mod messages;
mod registry;
mod router;

pub use handler::websocket_handler;
pub use messages::{iso_now, ClientEvent, ServerEvent};
pub use registry::{Connection, ConnectionId, ConnectionRegistry, RegistryError, Role};
pub use router::{EventRouter, Outlet};
