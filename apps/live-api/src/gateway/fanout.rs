//! Publish side: fan a payload out to a channel's subscribers.

use axum::extract::ws::Utf8Bytes;
use serde_json::Value;

use crate::error::PubSubError;

use super::events::OutboundMessage;
use super::PubSub;

impl PubSub {
    /// Deliver `payload` to every current subscriber of `channel_name`.
    ///
    /// The envelope is serialized once. A failed write to one subscriber is
    /// logged and skipped; it neither aborts the fan-out nor unsubscribes
    /// the connection. Zero reachable subscribers is not an error.
    pub fn broadcast(&self, channel_name: &str, payload: &Value) -> Result<(), PubSubError> {
        let channel = self
            .channels
            .get(channel_name)
            .ok_or_else(|| PubSubError::ChannelNotFound(channel_name.to_string()))?;

        let frame: Utf8Bytes = OutboundMessage::new(channel_name, payload).to_frame().into();

        let subscribers = channel.lock();
        let mut delivered = 0usize;
        for connection_id in subscribers.iter() {
            let Some(connection) = self.connections.lookup(connection_id) else {
                continue;
            };
            match connection.write(frame.clone()) {
                Ok(()) => delivered += 1,
                Err(err) => {
                    tracing::warn!(channel = %channel_name, %err, "failed to send broadcast message to subscriber");
                }
            }
        }

        tracing::debug!(
            channel = %channel_name,
            recipients = subscribers.len(),
            delivered,
            "broadcast to channel"
        );
        Ok(())
    }

    /// Deliver `payload` to a single subscriber of `channel_name`.
    pub fn send_to(
        &self,
        channel_name: &str,
        connection_id: &str,
        payload: &Value,
    ) -> Result<(), PubSubError> {
        let channel = self
            .channels
            .get(channel_name)
            .ok_or_else(|| PubSubError::ChannelNotFound(channel_name.to_string()))?;

        let connection = self
            .connections
            .lookup(connection_id)
            .ok_or_else(|| PubSubError::ConnectionNotFound(connection_id.to_string()))?;

        if !channel.is_subscribed(connection_id) {
            return Err(PubSubError::NotSubscribed {
                channel: channel_name.to_string(),
                connection_id: connection_id.to_string(),
            });
        }

        connection.send(channel_name, payload)
    }
}
