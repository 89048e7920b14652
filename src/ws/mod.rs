pub mod actor;
pub mod handler;

use tokio::sync::mpsc;

/// Sender half of a connection's outbound channel. The hub pushes serialized
/// frames here; the connection's writer task drains them into the socket.
pub type ConnectionSender = mpsc::UnboundedSender<axum::extract::ws::Message>;
