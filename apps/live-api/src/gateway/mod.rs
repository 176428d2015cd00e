//! WebSocket pub/sub gateway.
//!
//! [`PubSub`] owns the two registries: live connections and named channels.
//! Application code registers channels at startup and publishes through
//! [`PubSub::broadcast`] and [`PubSub::send_to`] from any task or thread.
//!
//! # Lock order
//!
//! There are two lock domains: the connection registry's `RwLock` and one
//! `Mutex` per channel. A channel lock may be held while the registry lock
//! is taken briefly (subscribe, unsubscribe, broadcast). The registry lock
//! is never held while a channel lock is taken, and no two channel locks
//! are ever held at once. The disconnect sweep releases the registry lock
//! before it visits the channels.

pub mod channel;
pub mod events;
pub mod fanout;
pub mod handler;
pub mod lifecycle;
pub mod registry;
pub mod server;
pub mod session;

pub use channel::{Channel, ChannelHandlers};
pub use events::{InboundMessage, OutboundMessage};
pub use session::Connection;

use channel::ChannelRegistry;
use registry::ConnectionRegistry;

/// The connection and channel broadcaster. Share it as `Arc<PubSub>`.
pub struct PubSub {
    connections: ConnectionRegistry,
    channels: ChannelRegistry,
    require_identity: bool,
}

impl PubSub {
    /// `require_identity` drops inbound frames from anonymous connections.
    pub fn new(require_identity: bool) -> Self {
        Self {
            connections: ConnectionRegistry::new(),
            channels: ChannelRegistry::new(),
            require_identity,
        }
    }

    /// Register a channel. Call once per name at startup, before serving.
    pub fn register_channel(&self, name: impl Into<String>, handlers: ChannelHandlers) {
        self.channels.register(name.into(), handlers);
    }

    pub fn connection(&self, connection_id: &str) -> Option<std::sync::Arc<Connection>> {
        self.connections.lookup(connection_id)
    }

    pub fn connection_count(&self) -> usize {
        self.connections.count()
    }

    pub fn channel_names(&self) -> Vec<String> {
        self.channels.names()
    }

    /// `None` when the channel is not registered.
    pub fn subscriber_count(&self, channel_name: &str) -> Option<usize> {
        self.channels
            .get(channel_name)
            .map(|channel| channel.subscriber_count())
    }
}
