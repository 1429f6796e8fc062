//! Live updates over WebSocket
//!
//! `GET /api/ws` upgrades an authenticated request and forwards every
//! [`LiveEvent`] the caller's scope covers. A connection that falls behind
//! the broadcast buffer skips the missed events and keeps streaming.

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Router};
use futures::{SinkExt, StreamExt};
use kernel::scope::{AccessScope, Principal};
use platform::events::{EventBus, LiveEvent};
use tokio::sync::broadcast::error::RecvError;

/// イベントの所在地のいずれかが範囲内なら配信
pub fn is_visible(scope: &AccessScope, event: &LiveEvent) -> bool {
    matches!(scope, AccessScope::National) || event.locations.iter().any(|l| scope.covers(l))
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    State(events): State<EventBus>,
    Extension(principal): Extension<Principal>,
    Extension(scope): Extension<AccessScope>,
) -> impl IntoResponse {
    tracing::info!(user_id = %principal.user_id, scope = ?scope, "Live update connection requested");
    ws.on_upgrade(move |socket| handle_socket(socket, events, principal, scope))
}

async fn handle_socket(socket: WebSocket, events: EventBus, principal: Principal, scope: AccessScope) {
    let mut subscriber = events.subscribe();
    let (mut sink, mut stream) = socket.split();

    loop {
        tokio::select! {
            incoming = stream.next() => match incoming {
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(Message::Ping(data))) => {
                    if sink.send(Message::Pong(data)).await.is_err() {
                        break;
                    }
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::debug!(user_id = %principal.user_id, error = %e, "WebSocket receive error");
                    break;
                }
            },
            event = subscriber.recv() => match event {
                Ok(event) => {
                    if !is_visible(&scope, &event) {
                        continue;
                    }
                    let json = match serde_json::to_string(&event) {
                        Ok(json) => json,
                        Err(e) => {
                            tracing::error!(error = %e, event_type = %event.event_type, "Failed to serialize live event");
                            continue;
                        }
                    };
                    if sink.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(user_id = %principal.user_id, skipped, "Live update subscriber lagged");
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    tracing::info!(user_id = %principal.user_id, "Live update connection closed");
}

/// `/ws`; expects `Principal` and `AccessScope` in the request extensions
pub fn live_router(events: EventBus) -> Router {
    Router::new().route("/ws", get(ws_handler)).with_state(events)
}
