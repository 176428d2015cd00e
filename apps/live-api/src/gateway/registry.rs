//! Registry of live connections, keyed by connection id.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::ws::Utf8Bytes;
use live_common::id::{prefix, prefixed_ulid};
use parking_lot::RwLock;
use tokio::sync::mpsc;

use crate::auth::Identity;
use crate::error::PubSubError;

use super::session::Connection;

/// All currently open connections.
///
/// A single `parking_lot::RwLock` guards the map. Every operation holds it
/// only for the map access itself: no I/O and no callbacks run under it.
pub struct ConnectionRegistry {
    connections: RwLock<HashMap<String, Arc<Connection>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
        }
    }

    /// Insert a connection under its own id. Fails if the id is taken.
    pub fn register(&self, connection: Arc<Connection>) -> Result<(), PubSubError> {
        let mut connections = self.connections.write();
        if connections.contains_key(&connection.id) {
            return Err(PubSubError::ConnectionExists(connection.id.clone()));
        }
        connections.insert(connection.id.clone(), connection);
        Ok(())
    }

    /// Allocate a fresh id and register the connection in one step.
    pub fn register_new(
        &self,
        identity: Option<Identity>,
        tx: mpsc::Sender<Utf8Bytes>,
    ) -> Arc<Connection> {
        self.register_with_ids(identity, tx, || prefixed_ulid(prefix::CONNECTION))
    }

    /// Allocation and insertion share one write-lock acquisition, so no other
    /// caller can claim the id between the collision check and the insert.
    fn register_with_ids(
        &self,
        identity: Option<Identity>,
        tx: mpsc::Sender<Utf8Bytes>,
        mut next_id: impl FnMut() -> String,
    ) -> Arc<Connection> {
        let mut connections = self.connections.write();
        let id = loop {
            let candidate = next_id();
            if !connections.contains_key(&candidate) {
                break candidate;
            }
            tracing::warn!(connection_id = %candidate, "connection id collision, retrying");
        };
        let connection = Arc::new(Connection::new(id.clone(), identity, tx));
        connections.insert(id, connection.clone());
        connection
    }

    pub fn lookup(&self, id: &str) -> Option<Arc<Connection>> {
        self.connections.read().get(id).cloned()
    }

    /// Remove a connection, returning it if it was registered.
    pub fn remove(&self, id: &str) -> Option<Arc<Connection>> {
        self.connections.write().remove(id)
    }

    /// Number of live connections.
    pub fn count(&self) -> usize {
        self.connections.read().len()
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
