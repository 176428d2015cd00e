//! Connect and disconnect handling.

use std::sync::Arc;

use axum::extract::ws::Utf8Bytes;
use tokio::sync::mpsc;

use crate::auth::Identity;

use super::session::Connection;
use super::PubSub;

impl PubSub {
    /// Register a newly opened connection under a fresh id.
    pub fn connect(&self, identity: Option<Identity>, tx: mpsc::Sender<Utf8Bytes>) -> Arc<Connection> {
        self.connections.register_new(identity, tx)
    }

    /// Tear down a closed connection.
    ///
    /// The registry entry goes first, so no new subscribe can succeed for
    /// this id. Then every channel is visited under its own lock and the id
    /// is dropped from its subscribers, running `on_unsubscribe` where it
    /// was a member.
    pub fn disconnect(&self, connection_id: &str) {
        let Some(connection) = self.connections.remove(connection_id) else {
            tracing::debug!(connection_id, "disconnect for unknown connection");
            return;
        };

        for channel in self.channels.all() {
            let mut subscribers = channel.lock();
            if subscribers.remove(connection_id) {
                tracing::debug!(channel = %channel.name(), connection_id, "removed from channel on disconnect");
                if let Some(hook) = &channel.handlers.on_unsubscribe {
                    hook(&connection);
                }
            }
        }
    }
}
