pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod gateway;
pub mod routes;

use std::sync::Arc;

use config::Config;
use db::kv::{KeyValueStore, MemoryStore};
use gateway::{ChannelHandlers, PubSub};

/// Shared application state available to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub pubsub: Arc<PubSub>,
    pub kv: Arc<dyn KeyValueStore>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Build the state the server runs with: every configured channel
    /// registered with no hooks, sessions held in memory.
    pub fn from_config(config: Config) -> Self {
        // Channels must exist before the first client connects.
        let pubsub = Arc::new(PubSub::new(config.require_identity));
        for name in &config.channels {
            pubsub.register_channel(name.as_str(), ChannelHandlers::new());
        }

        let kv: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());

        Self {
            pubsub,
            kv,
            config: Arc::new(config),
        }
    }
}
