use crate::chat::hub::HubSender;

/// Shared application state passed to all handlers via axum State extractor.
/// All mutable chat state lives behind the hub's command channel.
#[derive(Clone)]
pub struct AppState {
    /// Command channel into the hub event loop
    pub hub: HubSender,
}
