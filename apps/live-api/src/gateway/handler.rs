//! Inbound frame dispatch: subscribe, unsubscribe, message, and unknown types.

use std::sync::Arc;

use crate::error::PubSubError;

use super::events::{InboundMessage, TYPE_MESSAGE, TYPE_SUBSCRIBE, TYPE_UNSUBSCRIBE};
use super::session::Connection;
use super::PubSub;

impl PubSub {
    /// Process one text frame received on `connection`.
    ///
    /// Nothing is ever sent back: frames from anonymous connections (when
    /// identity is required), unparsable frames and unknown request types
    /// are dropped and the connection stays open.
    pub fn handle_frame(&self, connection: &Arc<Connection>, text: &str) {
        if self.require_identity && !connection.is_authenticated() {
            tracing::debug!(connection_id = %connection.id, "dropping frame from anonymous connection");
            return;
        }

        let request = match InboundMessage::parse(text) {
            Ok(request) => request,
            Err(err) => {
                let err = PubSubError::from(err);
                tracing::warn!(connection_id = %connection.id, %err, "could not unmarshal request");
                return;
            }
        };

        match request.kind.as_str() {
            TYPE_SUBSCRIBE => self.subscribe(&request.channel, &connection.id),
            TYPE_UNSUBSCRIBE => self.unsubscribe(&request.channel, &connection.id),
            TYPE_MESSAGE => self.dispatch_message(&request.channel, connection, &request),
            other => {
                tracing::warn!(connection_id = %connection.id, kind = %other, "unknown pubsub websocket request type");
            }
        }
    }
}
