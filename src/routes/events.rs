//! WebSocket push channel for order notifications.
//!
//! The client presents its REST bearer token as a query parameter; the room
//! it lands in is derived from the verified claims, so a session can only
//! ever subscribe to its own events.

use axum::{
    Router,
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
    routing,
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;

use crate::{
    app_error::AppError,
    app_state::AppState,
    auth::{Role, jwt},
    relay::{buyer_room, seller_room},
};

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/events/ws", routing::get(handle_events_ws))
}

#[derive(Deserialize)]
struct EventsQuery {
    token: String,
}

async fn handle_events_ws(
    State(state): State<AppState>,
    Query(query): Query<EventsQuery>,
    ws: WebSocketUpgrade,
) -> Result<impl IntoResponse, AppError> {
    let claims = jwt::decode_token(&query.token)?;

    let room = match claims.role {
        Role::Seller => seller_room(claims.sub),
        Role::Buyer => buyer_room(claims.sub),
        Role::Admin => {
            return Err(AppError::ForbiddenResource(
                "Admin tokens cannot subscribe to order events".to_string(),
            ));
        }
    };

    Ok(ws.on_upgrade(move |socket| run_session(socket, state, room)))
}

async fn run_session(socket: WebSocket, state: AppState, room: String) {
    let (session_id, mut rx) = state.relay.join(&room);
    tracing::info!(%room, session_id, "Notification session connected");

    let (mut ws_sink, mut ws_stream) = socket.split();

    loop {
        tokio::select! {
            event = rx.recv() => {
                // Channel closes when a rejoin replaces this session.
                let Some(event) = event else { break };
                let Ok(json) = serde_json::to_string(&event) else { continue };
                if ws_sink.send(Message::Text(json.into())).await.is_err() {
                    break;
                }
            }
            msg = ws_stream.next() => {
                match msg {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    // Inbound frames carry nothing; the channel is push-only.
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    state.relay.leave(&room, session_id);
    tracing::info!(%room, session_id, "Notification session disconnected");
}
