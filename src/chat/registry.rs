//! Connection registry: the authoritative set of currently open connections.
//! Only the hub task touches it, so it is plain owned data — no locking.

use std::collections::BTreeMap;

use crate::ws::ConnectionSender;

/// Attempt to register a connection under an id that is already present.
/// Ids are assigned monotonically, so hitting this means a bookkeeping bug,
/// not a recoverable condition.
#[derive(Debug, thiserror::Error)]
#[error("connection id {0} is already registered")]
pub struct DuplicateIdError(pub u64);

/// One live client session.
#[derive(Debug)]
pub struct Connection {
    pub id: u64,
    /// Presentational label only, never empty. Not an identity key:
    /// two connections may share a display name.
    pub display_name: String,
    pub tx: ConnectionSender,
    /// True from registration until a close/error or failed delivery is seen.
    pub is_open: bool,
}

impl Connection {
    pub fn new(id: u64, display_name: String, tx: ConnectionSender) -> Self {
        Self {
            id,
            display_name,
            tx,
            is_open: true,
        }
    }
}

/// Set of open connections keyed by id. Iteration runs in id order, which
/// equals join order.
#[derive(Debug, Default)]
pub struct Registry {
    connections: BTreeMap<u64, Connection>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a connection. A duplicate id is an invariant violation.
    pub fn register(&mut self, connection: Connection) -> Result<(), DuplicateIdError> {
        let id = connection.id;
        if self.connections.contains_key(&id) {
            return Err(DuplicateIdError(id));
        }
        self.connections.insert(id, connection);
        Ok(())
    }

    /// Remove a connection. Close may be observed more than once, so an
    /// unknown id is a no-op, not an error.
    pub fn unregister(&mut self, id: u64) -> Option<Connection> {
        self.connections.remove(&id)
    }

    pub fn get(&self, id: u64) -> Option<&Connection> {
        self.connections.get(&id)
    }

    /// Swap a connection's display name, returning the previous one.
    /// The caller has already validated the new name as non-empty.
    pub fn rename(&mut self, id: u64, new_name: &str) -> Option<String> {
        let connection = self.connections.get_mut(&id)?;
        Some(std::mem::replace(
            &mut connection.display_name,
            new_name.to_string(),
        ))
    }

    /// Display names of every open connection, in registry iteration order.
    pub fn snapshot_open_names(&self) -> Vec<String> {
        self.connections
            .values()
            .filter(|c| c.is_open)
            .map(|c| c.display_name.clone())
            .collect()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Connection> {
        self.connections.values_mut()
    }
}
