//! The hub: a single task owning all mutable chat state. Connection actors
//! feed it commands over an mpsc channel; it mutates the registry and
//! broadcasts in arrival order. Because every mutation and every broadcast
//! happens inside this one task, all connections observe the same relative
//! order of broadcasts, and the registry needs no lock.

use tokio::sync::{mpsc, oneshot};

use super::broadcast::{broadcast_to_all, send_to};
use super::protocol::{default_display_name, ClientEvent, ServerEvent};
use super::registry::{Connection, Registry};
use crate::ws::ConnectionSender;

/// Commands from connection actors to the hub.
#[derive(Debug)]
pub enum HubCommand {
    /// A new connection was accepted. The hub assigns an id, registers the
    /// connection, and replies on `id_tx`.
    Connect {
        tx: ConnectionSender,
        id_tx: oneshot::Sender<u64>,
    },
    /// A text frame arrived from the client.
    Inbound { id: u64, text: String },
    /// The connection's transport closed or errored.
    Disconnect { id: u64 },
}

pub type HubSender = mpsc::UnboundedSender<HubCommand>;

/// Create the command channel and spawn the hub loop.
pub fn spawn_hub() -> HubSender {
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(run_hub(rx));
    tx
}

/// Drain commands until every sender is dropped.
pub async fn run_hub(mut rx: mpsc::UnboundedReceiver<HubCommand>) {
    let mut hub = Hub::new();
    while let Some(cmd) = rx.recv().await {
        hub.handle(cmd);
    }
}

/// All mutable chat state. Only ever touched from the hub task.
pub struct Hub {
    registry: Registry,
    next_id: u64,
}

impl Hub {
    pub fn new() -> Self {
        Self {
            registry: Registry::new(),
            next_id: 1,
        }
    }

    pub fn handle(&mut self, cmd: HubCommand) {
        match cmd {
            HubCommand::Connect { tx, id_tx } => self.connect(tx, id_tx),
            HubCommand::Inbound { id, text } => self.inbound(id, &text),
            HubCommand::Disconnect { id } => self.disconnect(id),
        }
    }

    fn connect(&mut self, tx: ConnectionSender, id_tx: oneshot::Sender<u64>) {
        let id = self.next_id;
        self.next_id += 1;

        let name = default_display_name();
        if let Err(e) = self.registry.register(Connection::new(id, name.clone(), tx)) {
            // Unreachable with monotonic ids. Abandon this connection attempt
            // (dropping id_tx makes the actor bail out) and keep serving.
            tracing::error!(error = %e, "Connection registration failed");
            return;
        }

        if id_tx.send(id).is_err() {
            // Actor died between upgrade and registration. Nothing was
            // announced yet, so remove silently.
            self.registry.unregister(id);
            return;
        }

        tracing::info!(id, name = %name, "Client connected");

        // Welcome goes to this client only, before anything is echoed to all.
        if let Some(connection) = self.registry.get(id) {
            send_to(connection, &ServerEvent::welcome(name.clone()));
        }

        self.broadcast(ServerEvent::system(format!("{} se ha unido al chat", name)));
        self.broadcast_presence();
    }

    fn inbound(&mut self, id: u64, text: &str) {
        let event = match serde_json::from_str::<ClientEvent>(text) {
            Ok(event) => event,
            Err(e) => {
                // Malformed or unknown frame: drop it, the connection stays open.
                tracing::debug!(id, error = %e, "Ignoring unparseable frame");
                return;
            }
        };

        match event {
            ClientEvent::Join { name } => self.rename(id, &name),
            ClientEvent::Rename { new_name } => self.rename(id, &new_name),
            ClientEvent::Chat { text } => self.chat(id, text),
        }
    }

    /// `join` and `rename` are intentional aliases: both swap the display
    /// name and emit the same system + presence pair.
    fn rename(&mut self, id: u64, requested: &str) {
        let new_name = requested.trim();
        if new_name.is_empty() {
            tracing::debug!(id, "Ignoring rename to an empty name");
            return;
        }

        let Some(old_name) = self.registry.rename(id, new_name) else {
            return;
        };

        tracing::info!(id, old = %old_name, new = %new_name, "Client renamed");
        self.broadcast(ServerEvent::system(format!(
            "{} ahora es {}",
            old_name, new_name
        )));
        self.broadcast_presence();
    }

    fn chat(&mut self, id: u64, text: String) {
        if text.is_empty() {
            tracing::debug!(id, "Ignoring empty chat message");
            return;
        }
        // The user field is the sender's name at time of sending.
        let Some(user) = self.registry.get(id).map(|c| c.display_name.clone()) else {
            return;
        };
        self.broadcast(ServerEvent::chat(user, text));
    }

    /// Idempotent: a second close notification for an already-unregistered
    /// id is a no-op.
    fn disconnect(&mut self, id: u64) {
        let Some(connection) = self.registry.unregister(id) else {
            return;
        };

        tracing::info!(id, name = %connection.display_name, "Client disconnected");
        self.broadcast(ServerEvent::system(format!(
            "{} se ha desconectado",
            connection.display_name
        )));
        self.broadcast_presence();
    }

    /// A delivery failure means that connection is closing: run the same
    /// unregister + notify path instead of surfacing an error.
    fn broadcast(&mut self, event: ServerEvent) {
        for id in broadcast_to_all(&mut self.registry, &event) {
            self.disconnect(id);
        }
    }

    fn broadcast_presence(&mut self) {
        let users = self.registry.snapshot_open_names();
        self.broadcast(ServerEvent::presence(users));
    }
}

impl Default for Hub {
    fn default() -> Self {
        Self::new()
    }
}
