use axum::{
    extract::{
        ws::{WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};

use crate::state::AppState;
use crate::ws::actor;

/// GET /ws
/// WebSocket upgrade endpoint. No authentication: a client is identified
/// only by its server-assigned id and display name.
pub async fn ws_upgrade(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| handle_accepted(socket, state))
}

/// Hand an accepted WebSocket to the per-connection actor.
async fn handle_accepted(socket: WebSocket, state: AppState) {
    actor::run_connection(socket, state).await;
}
