//! Per-connection state and its write primitive.

use std::time::Instant;

use axum::extract::ws::Utf8Bytes;
use serde_json::Value;
use tokio::sync::mpsc::{self, error::TrySendError};

use crate::auth::Identity;
use crate::error::PubSubError;

use super::events::OutboundMessage;

/// A live WebSocket connection as seen by the registries.
///
/// Writes never touch the socket directly: they are queued on a bounded
/// channel drained by the connection's own task, so a write is always
/// non-blocking and safe to perform while a channel lock is held.
#[derive(Debug)]
pub struct Connection {
    /// Unique connection identifier (`ws_` prefixed ULID).
    pub id: String,
    /// Identity attached at connect time; `None` for anonymous visitors.
    pub identity: Option<Identity>,
    pub connected_at: Instant,
    tx: mpsc::Sender<Utf8Bytes>,
}

impl Connection {
    pub fn new(id: String, identity: Option<Identity>, tx: mpsc::Sender<Utf8Bytes>) -> Self {
        Self {
            id,
            identity,
            connected_at: Instant::now(),
            tx,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    /// Queue a pre-serialized frame for this connection.
    ///
    /// Fails when the outbound buffer is full (slow client) or the
    /// connection task has already gone away.
    pub fn write(&self, frame: Utf8Bytes) -> Result<(), PubSubError> {
        self.tx.try_send(frame).map_err(|err| {
            let reason = match err {
                TrySendError::Full(_) => "outbound buffer full",
                TrySendError::Closed(_) => "connection closed",
            };
            PubSubError::WriteFailed {
                connection_id: self.id.clone(),
                reason,
            }
        })
    }

    /// Send one outbound envelope to this connection only.
    ///
    /// Channel hooks use this to reply to the connection they were handed.
    pub fn send(&self, channel: &str, payload: &Value) -> Result<(), PubSubError> {
        self.write(OutboundMessage::new(channel, payload).to_frame().into())
    }
}
