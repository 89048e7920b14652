//! Broadcast helpers. An event is serialized once and the identical text
//! frame goes to every open connection. A failed send never aborts the loop:
//! the connection is marked closed and reported back so the hub can run its
//! disconnect path.

use axum::extract::ws::Message;

use super::protocol::ServerEvent;
use super::registry::{Connection, Registry};

/// Send `event` to every open connection. Returns the ids whose delivery
/// failed.
pub fn broadcast_to_all(registry: &mut Registry, event: &ServerEvent) -> Vec<u64> {
    let payload = match serde_json::to_string(event) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize broadcast event");
            return Vec::new();
        }
    };
    let msg = Message::Text(payload.into());

    let mut failed = Vec::new();
    for connection in registry.iter_mut() {
        if !connection.is_open {
            continue;
        }
        if connection.tx.send(msg.clone()).is_err() {
            // Writer task is gone — the socket closed under us.
            connection.is_open = false;
            failed.push(connection.id);
        }
    }
    failed
}

/// Send `event` to exactly one connection. Used for the initial welcome so
/// the new client learns its assigned name without it being echoed to
/// everyone else.
pub fn send_to(connection: &Connection, event: &ServerEvent) -> bool {
    let payload = match serde_json::to_string(event) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize event");
            return false;
        }
    };
    connection.tx.send(Message::Text(payload.into())).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::registry::Connection;
    use tokio::sync::mpsc;

    #[test]
    fn test_failed_delivery_is_isolated() {
        let mut registry = Registry::new();

        let (tx_a, mut rx_a) = mpsc::unbounded_channel();
        registry
            .register(Connection::new(1, "Ada".to_string(), tx_a))
            .unwrap();

        // Drop the receiver: delivery to this connection will fail.
        let (tx_b, _) = mpsc::unbounded_channel();
        registry
            .register(Connection::new(2, "Eva".to_string(), tx_b))
            .unwrap();

        let (tx_c, mut rx_c) = mpsc::unbounded_channel();
        registry
            .register(Connection::new(3, "Leo".to_string(), tx_c))
            .unwrap();

        let failed = broadcast_to_all(&mut registry, &ServerEvent::system("hola"));
        assert_eq!(failed, vec![2]);

        // Connections before and after the failing one still got the frame.
        assert!(rx_a.try_recv().is_ok());
        assert!(rx_c.try_recv().is_ok());
        // The failing connection is no longer counted as open.
        assert_eq!(registry.snapshot_open_names(), vec!["Ada", "Leo"]);
    }

    #[test]
    fn test_identical_bytes_to_every_connection() {
        let mut registry = Registry::new();
        let (tx_a, mut rx_a) = mpsc::unbounded_channel();
        let (tx_b, mut rx_b) = mpsc::unbounded_channel();
        registry
            .register(Connection::new(1, "Ada".to_string(), tx_a))
            .unwrap();
        registry
            .register(Connection::new(2, "Eva".to_string(), tx_b))
            .unwrap();

        let event = ServerEvent::chat("Ada", "hola");
        assert!(broadcast_to_all(&mut registry, &event).is_empty());

        match (rx_a.try_recv().unwrap(), rx_b.try_recv().unwrap()) {
            (Message::Text(frame_a), Message::Text(frame_b)) => {
                assert_eq!(frame_a.as_str(), frame_b.as_str());
            }
            other => panic!("expected text frames, got {:?}", other),
        }
    }
}
