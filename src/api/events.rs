use axum::{
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    response::IntoResponse,
    routing::get,
    Extension, Router,
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use sqlx::PgPool;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use crate::api::auth::Claims;
use crate::utils::registry::SharedRegistry;

/// Defines the live-event WebSocket route
pub fn event_routes() -> Router<PgPool> {
    Router::new().route("/events", get(ws_handler))
}

/// Frames a client may send upstream: room subscription management only.
/// Everything else flows downstream.
#[derive(Debug, Deserialize)]
struct ClientFrame {
    action: String,
    room: Option<String>,
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    Extension(registry): Extension<SharedRegistry>,
    Extension(claims): Extension<Claims>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, registry, claims.username))
}

/// Pumps registry events down to the client and room join/leave frames up
/// into the registry. The connection is registered for its whole lifetime and
/// always unregistered on the way out.
async fn handle_socket(socket: WebSocket, registry: SharedRegistry, employee: String) {
    let (connection_id, mut events) = registry.register_user(&employee).await;
    info!("Live events connected for {employee} ({connection_id})");

    let (mut sink, mut stream) = socket.split();

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => {
                    let Ok(text) = serde_json::to_string(&event) else {
                        continue;
                    };
                    if sink.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Event stream for {employee} lagged, {skipped} events dropped");
                }
                Err(RecvError::Closed) => break,
            },
            frame = stream.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    let Ok(frame) = serde_json::from_str::<ClientFrame>(&text) else {
                        continue;
                    };
                    match (frame.action.as_str(), frame.room) {
                        ("join", Some(room)) => registry.join_room(&room, &employee).await,
                        ("leave", Some(room)) => registry.leave_room(&room, &employee).await,
                        _ => {}
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(_)) => break,
            },
        }
    }

    registry.unregister_user(&employee, connection_id).await;
    info!("Live events disconnected for {employee} ({connection_id})");
}
