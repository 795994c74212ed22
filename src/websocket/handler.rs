//! WebSocket Handler
//!
//! Runs the handshake gate, upgrades admitted requests, and drives the
//! connection lifecycle against the hub.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;

use super::gate::{GateDecision, UpgradeRequest};
use super::hub::BroadcastHub;
use super::messages::{ClientMessage, Control};
use super::registry::ConnectionState;
use crate::api::AppState;

/// WebSocket upgrade handler
///
/// The gate runs before any hub state is created; a denied attempt is
/// answered with 403 and never reaches the registry.
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    let request = UpgradeRequest {
        headers: &headers,
        active_connections: state.hub.connection_count().await,
    };

    if let GateDecision::Deny(reason) = state.gate.check(&request).await {
        tracing::warn!(%reason, "WebSocket upgrade denied");
        return (StatusCode::FORBIDDEN, reason.to_string()).into_response();
    }

    let hub = Arc::clone(&state.hub);
    ws.on_upgrade(move |socket| handle_socket(socket, hub))
}

/// Handle an established WebSocket connection
async fn handle_socket(socket: WebSocket, hub: Arc<BroadcastHub>) {
    let (mut sender, mut receiver) = socket.split();

    let (connection_id, mut rx) = match hub.register().await {
        Ok(pair) => pair,
        Err(e) => {
            tracing::error!(error = %e, "Failed to register WebSocket connection");
            let error_msg = Control::Error {
                message: e.to_string(),
            };
            if let Ok(text) = serde_json::to_string(&error_msg) {
                let _ = sender.send(Message::Text(text)).await;
            }
            return;
        }
    };

    let connected = Control::Connected {
        connection_id: connection_id.clone(),
    };
    let greeting = match serde_json::to_string(&connected) {
        Ok(text) => text,
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize greeting");
            hub.on_connection_closed(&connection_id).await;
            return;
        }
    };
    if sender.send(Message::Text(greeting)).await.is_err() {
        tracing::debug!(connection_id = %connection_id, "Failed to send greeting");
        hub.on_connection_closed(&connection_id).await;
        return;
    }

    let conn_id_for_send = connection_id.clone();

    // Drain the bounded outbound buffer into the socket.
    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            match serde_json::to_string(&msg) {
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
                    tracing::error!(error = %e, "Failed to serialize message");
                }
            }
        }
    });

    let hub_for_recv = Arc::clone(&hub);
    let conn_id_for_recv = connection_id.clone();

    // Feed inbound frames into the hub's entry points.
    let mut recv_task = tokio::spawn(async move {
        while let Some(result) = receiver.next().await {
            match result {
                Ok(msg) => {
                    if !handle_ws_message(&hub_for_recv, &conn_id_for_recv, msg).await {
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

    hub.on_connection_closed(&connection_id).await;
}

/// Handle a received WebSocket frame
///
/// Returns false if the connection should be closed.
async fn handle_ws_message(
    hub: &Arc<BroadcastHub>,
    connection_id: &str,
    message: Message,
) -> bool {
    // Frames arriving after shutdown was initiated are ignored.
    if hub.connection_state(connection_id).await != Some(ConnectionState::Open) {
        return !matches!(message, Message::Close(_));
    }

    match message {
        Message::Text(text) => {
            match serde_json::from_str::<ClientMessage>(&text) {
                Ok(client_msg) => {
                    handle_client_message(hub, connection_id, client_msg).await;
                }
                Err(e) => {
                    tracing::debug!(
                        connection_id = %connection_id,
                        error = %e,
                        text = %text,
                        "Invalid client message"
                    );
                    // Malformed input is not fatal; report and stay open.
                    let error_msg = Control::Error {
                        message: format!("Invalid message format: {}", e),
                    };
                    let _ = hub.send_to(connection_id, error_msg).await;
                }
            }
            true
        }
        Message::Binary(_) => {
            let error_msg = Control::Error {
                message: "Binary messages not supported".to_string(),
            };
            let _ = hub.send_to(connection_id, error_msg).await;
            true
        }
        Message::Ping(_) | Message::Pong(_) => true,
        Message::Close(_) => {
            tracing::debug!(connection_id = %connection_id, "Client requested close");
            hub.mark_closing(connection_id).await;
            false
        }
    }
}

/// Handle a parsed client message
async fn handle_client_message(
    hub: &Arc<BroadcastHub>,
    connection_id: &str,
    message: ClientMessage,
) {
    match message {
        ClientMessage::Subscribe { topic } => match hub.subscribe(connection_id, &topic).await {
            Ok(()) => {
                let _ = hub.send_to(connection_id, Control::Subscribed { topic }).await;
            }
            Err(e) => {
                tracing::warn!(
                    connection_id = %connection_id,
                    topic = %topic,
                    error = %e,
                    "Subscribe error"
                );
                let error_msg = Control::Error {
                    message: e.to_string(),
                };
                let _ = hub.send_to(connection_id, error_msg).await;
            }
        },
        ClientMessage::Unsubscribe { topic } => match hub.unsubscribe(connection_id, &topic).await {
            Ok(()) => {
                let _ = hub
                    .send_to(connection_id, Control::Unsubscribed { topic })
                    .await;
            }
            Err(e) => {
                tracing::warn!(
                    connection_id = %connection_id,
                    topic = %topic,
                    error = %e,
                    "Unsubscribe error"
                );
                let error_msg = Control::Error {
                    message: e.to_string(),
                };
                let _ = hub.send_to(connection_id, error_msg).await;
            }
        },
    }
}
