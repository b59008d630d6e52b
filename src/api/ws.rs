//! WebSocket bridge between realtime clients and the notification hub.

use crate::service::MailwatchService;
use axum::extract::ws::{Message as WsMessage, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tracing::{debug, warn};

/// WebSocket upgrade handler for `GET /ws`.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(service): State<Arc<MailwatchService>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, service))
}

/// Bridges one socket to the hub.
///
/// A forward task drains hub events (welcome, pong, message pushes) to the
/// socket; the read loop feeds client frames into the hub. Disconnects,
/// transport errors, and an idle sweep (which closes the event stream) all
/// end with the subscription removed.
async fn handle_socket(socket: WebSocket, service: Arc<MailwatchService>) {
    let hub = service.hub();
    let (client_id, mut events) = hub.connect();
    let (mut sink, mut stream) = socket.split();

    let forward_id = client_id.clone();
    let forward = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            let payload = match serde_json::to_string(&event) {
                Ok(payload) => payload,
                Err(e) => {
                    warn!(client_id = %forward_id, error = %e, "failed to encode event");
                    continue;
                }
            };
            if sink.send(WsMessage::Text(payload.into())).await.is_err() {
                break;
            }
        }
        // Event stream closed (disconnect or idle sweep): close the socket.
        let _ = sink.close().await;
    });

    while let Some(frame) = stream.next().await {
        match frame {
            Ok(WsMessage::Text(text)) => hub.handle_message(&client_id, &text),
            Ok(WsMessage::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                debug!(client_id = %client_id, error = %e, "websocket transport error");
                break;
            }
        }
    }

    hub.disconnect(&client_id);
    forward.abort();
}
