//! Named channels, their subscriber sets and lifecycle hooks.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::{Mutex, MutexGuard};

use super::events::InboundMessage;
use super::session::Connection;
use super::PubSub;

/// Hook run on subscribe/unsubscribe, with the channel lock held.
pub type EventHandler = Arc<dyn Fn(&Arc<Connection>) + Send + Sync>;

/// Hook run for `message` requests, without any lock held.
pub type MessageHandler = Arc<dyn Fn(&Arc<Connection>, &InboundMessage) + Send + Sync>;

/// Optional callbacks attached to a channel at registration.
///
/// `on_subscribe` and `on_unsubscribe` run synchronously while the channel
/// lock is held. They must not block and must not call back into the
/// broadcaster for the same channel (the lock is not reentrant); to reply,
/// write to the connection handle directly with [`Connection::send`].
#[derive(Clone, Default)]
pub struct ChannelHandlers {
    pub on_subscribe: Option<EventHandler>,
    pub on_unsubscribe: Option<EventHandler>,
    pub on_message: Option<MessageHandler>,
}

impl ChannelHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_subscribe(mut self, f: impl Fn(&Arc<Connection>) + Send + Sync + 'static) -> Self {
        self.on_subscribe = Some(Arc::new(f));
        self
    }

    pub fn on_unsubscribe(mut self, f: impl Fn(&Arc<Connection>) + Send + Sync + 'static) -> Self {
        self.on_unsubscribe = Some(Arc::new(f));
        self
    }

    pub fn on_message(
        mut self,
        f: impl Fn(&Arc<Connection>, &InboundMessage) + Send + Sync + 'static,
    ) -> Self {
        self.on_message = Some(Arc::new(f));
        self
    }
}

impl fmt::Debug for ChannelHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelHandlers")
            .field("on_subscribe", &self.on_subscribe.is_some())
            .field("on_unsubscribe", &self.on_unsubscribe.is_some())
            .field("on_message", &self.on_message.is_some())
            .finish()
    }
}

/// A named topic with its own lock.
#[derive(Debug)]
pub struct Channel {
    name: String,
    pub(crate) handlers: ChannelHandlers,
    subscribers: Mutex<HashSet<String>>,
}

impl Channel {
    pub fn new(name: String, handlers: ChannelHandlers) -> Self {
        Self {
            name,
            handlers,
            subscribers: Mutex::new(HashSet::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_subscribed(&self, connection_id: &str) -> bool {
        self.subscribers.lock().contains(connection_id)
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, HashSet<String>> {
        self.subscribers.lock()
    }
}

/// Channel name → channel, filled at startup.
pub struct ChannelRegistry {
    channels: DashMap<String, Arc<Channel>>,
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self {
            channels: DashMap::new(),
        }
    }

    /// Register (or replace) a channel. Replacing drops the old subscriber set.
    pub fn register(&self, name: String, handlers: ChannelHandlers) {
        let channel = Arc::new(Channel::new(name.clone(), handlers));
        if self.channels.insert(name.clone(), channel).is_some() {
            tracing::warn!(channel = %name, "channel registered twice, previous registration replaced");
        }
    }

    /// Clone the channel handle out so no shard guard outlives the lookup.
    pub fn get(&self, name: &str) -> Option<Arc<Channel>> {
        self.channels.get(name).map(|entry| entry.value().clone())
    }

    pub fn all(&self) -> Vec<Arc<Channel>> {
        self.channels.iter().map(|entry| entry.value().clone()).collect()
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.channels.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }
}

impl Default for ChannelRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl PubSub {
    /// Add `connection_id` to the channel's subscribers and run `on_subscribe`.
    ///
    /// Unknown channels are logged and ignored; they are never created here.
    /// The liveness check happens under the channel lock so a concurrent
    /// disconnect sweep cannot miss the new entry.
    pub fn subscribe(&self, channel_name: &str, connection_id: &str) {
        let Some(channel) = self.channels.get(channel_name) else {
            tracing::warn!(channel = %channel_name, connection_id, "client tried to subscribe to unknown channel");
            return;
        };

        let mut subscribers = channel.lock();
        let Some(connection) = self.connections.lookup(connection_id) else {
            tracing::warn!(channel = %channel_name, connection_id, "subscribe from connection that is not live");
            return;
        };

        subscribers.insert(connection_id.to_string());
        if let Some(hook) = &channel.handlers.on_subscribe {
            hook(&connection);
        }
    }

    /// Remove `connection_id` from the channel and run `on_unsubscribe`.
    ///
    /// The hook runs even when the id was not a member, as long as the
    /// connection is still live.
    pub fn unsubscribe(&self, channel_name: &str, connection_id: &str) {
        let Some(channel) = self.channels.get(channel_name) else {
            tracing::warn!(channel = %channel_name, connection_id, "client tried to unsubscribe from unknown channel");
            return;
        };

        let mut subscribers = channel.lock();
        subscribers.remove(connection_id);

        if let Some(hook) = &channel.handlers.on_unsubscribe {
            if let Some(connection) = self.connections.lookup(connection_id) {
                hook(&connection);
            }
        }
    }

    pub fn is_subscribed(&self, channel_name: &str, connection_id: &str) -> bool {
        self.channels
            .get(channel_name)
            .is_some_and(|channel| channel.is_subscribed(connection_id))
    }

    /// Hand a `message` request to the channel's `on_message` hook.
    pub fn dispatch_message(
        &self,
        channel_name: &str,
        connection: &Arc<Connection>,
        message: &InboundMessage,
    ) {
        let Some(channel) = self.channels.get(channel_name) else {
            tracing::warn!(channel = %channel_name, kind = %message.kind, "unknown channel on websocket message");
            return;
        };

        if let Some(hook) = &channel.handlers.on_message {
            hook(connection, message);
        }
    }
}
