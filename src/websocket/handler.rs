//! WebSocket Handler
//!
//! Handles WebSocket upgrade requests and manages the connection lifecycle.

use axum::{
    extract::{
        ws::{rejection::WebSocketUpgradeRejection, Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::{header::ORIGIN, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;

use super::messages::{ClientEvent, ServerEvent};
use super::router::EventRouter;
use crate::api::AppState;

/// WebSocket upgrade handler
///
/// Browsers must present an allowed `Origin`; clients that send none are
/// let through. The origin is checked before the upgrade itself.
pub async fn websocket_handler(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    if let Some(origin) = headers.get(ORIGIN) {
        let origin = origin.to_str().unwrap_or_default();
        if !state.config.is_origin_allowed(origin) {
            tracing::warn!(origin = %origin, "WebSocket upgrade rejected: origin not allowed");
            return StatusCode::FORBIDDEN.into_response();
        }
    }

    let ws = match ws {
        Ok(ws) => ws,
        Err(rejection) => return rejection.into_response(),
    };

    let router = Arc::clone(&state.router);
    ws.on_upgrade(move |socket| handle_socket(socket, router))
}

/// Handle an established WebSocket connection
async fn handle_socket(socket: WebSocket, router: Arc<EventRouter>) {
    let (mut sender, mut receiver) = socket.split();

    let (tx, mut rx) = mpsc::unbounded_channel::<ServerEvent>();

    let connection_id = match router.connect(tx).await {
        Ok(id) => id,
        Err(e) => {
            tracing::error!(error = %e, "Connection registry rejected new session");
            let _ = sender.send(Message::Close(None)).await;
            return;
        }
    };

    let conn_id_for_send = connection_id.clone();

    // Task to forward routed events from the channel to the socket
    let mut send_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match serde_json::to_string(&event) {
                Ok(text) => {
                    if sender.send(Message::Text(text)).await.is_err() {
                        tracing::debug!(
                            connection_id = %conn_id_for_send,
                            "WebSocket send failed, closing connection"
                        );
                        break;
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, event = event.name(), "Failed to serialize event");
                }
            }
        }
    });

    let router_for_recv = Arc::clone(&router);
    let conn_id_for_recv = connection_id.clone();

    // Task to receive frames and route them, one at a time
    let mut recv_task = tokio::spawn(async move {
        while let Some(result) = receiver.next().await {
            match result {
                Ok(msg) => {
                    if !handle_ws_message(&router_for_recv, &conn_id_for_recv, msg).await {
                        break;
                    }
                }
                Err(e) => {
                    tracing::debug!(
                        connection_id = %conn_id_for_recv,
                        error = %e,
                        "WebSocket receive error"
                    );
                    break;
                }
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => {
            recv_task.abort();
        }
        _ = &mut recv_task => {
            send_task.abort();
        }
    }

    router.disconnect(&connection_id).await;
}

/// Handle a received WebSocket frame
///
/// Returns false if the connection should be closed.
async fn handle_ws_message(router: &EventRouter, connection_id: &str, message: Message) -> bool {
    match message {
        Message::Text(text) => {
            match parse_client_event(&text) {
                Ok(event) => router.dispatch(connection_id, event).await,
                Err(e) => {
                    // No error channel back to clients; drop the frame
                    tracing::debug!(
                        connection_id = %connection_id,
                        error = %e,
                        len = text.len(),
                        "Dropping unparseable frame"
                    );
                }
            }
            true
        }
        Message::Binary(_) => {
            tracing::debug!(connection_id = %connection_id, "Dropping binary frame");
            true
        }
        Message::Ping(_) | Message::Pong(_) => true,
        Message::Close(_) => {
            tracing::debug!(connection_id = %connection_id, "Client requested close");
            false
        }
    }
}

fn parse_client_event(text: &str) -> Result<ClientEvent, serde_json::Error> {
    serde_json::from_str(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn joined(router: &EventRouter) -> (String, mpsc::UnboundedReceiver<ServerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = router.connect(tx).await.unwrap();
        (id, rx)
    }

    #[tokio::test]
    async fn test_text_frame_is_routed() {
        let router = EventRouter::new();
        let (patient, _patient_rx) = joined(&router).await;
        let (_staff, mut staff_rx) = joined(&router).await;

        let frame = Message::Text(json!({"event": "patient_connected", "name": "Jo"}).to_string());
        assert!(handle_ws_message(&router, &patient, frame).await);

        let event = staff_rx.try_recv().unwrap();
        assert_eq!(event.name(), "patient_connected");
    }

    #[tokio::test]
    async fn test_invalid_frames_keep_connection_open() {
        let router = EventRouter::new();
        let (id, mut rx) = joined(&router).await;

        assert!(handle_ws_message(&router, &id, Message::Text("not json".to_string())).await);
        assert!(
            handle_ws_message(&router, &id, Message::Text(r#"{"event":"unknown"}"#.to_string()))
                .await
        );
        assert!(handle_ws_message(&router, &id, Message::Binary(vec![1, 2, 3])).await);

        assert!(rx.try_recv().is_err());
        assert_eq!(router.connection_count().await, 1);
    }

    #[tokio::test]
    async fn test_close_frame_ends_connection() {
        let router = EventRouter::new();
        let (id, _rx) = joined(&router).await;

        assert!(!handle_ws_message(&router, &id, Message::Close(None)).await);
    }

    #[test]
    fn test_parse_client_event() {
        let event = parse_client_event(r#"{"event":"typing_stop","field":"dob"}"#).unwrap();
        assert_eq!(
            event,
            ClientEvent::TypingStop {
                field: "dob".to_string()
            }
        );
    }
}
