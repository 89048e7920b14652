use axum::{routing::get, Router};

use crate::state::AppState;
use crate::ws::handler as ws_handler;

/// Build the axum Router: the WebSocket endpoint plus the plain-text
/// responder hosting platforms poll for health checks.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health_check))
        .route("/health", get(health_check))
        .route("/ws", get(ws_handler::ws_upgrade))
        .with_state(state)
}

/// Plain-text health responder. Shares no state with the chat core.
async fn health_check() -> &'static str {
    "WebSocket chat server is running"
}
