use std::time::Duration;

/// Live API configuration, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port the HTTP server binds to.
    pub port: u16,
    /// Channels registered at startup. Clients cannot create channels.
    pub channels: Vec<String>,
    /// Drop inbound frames from connections that carry no identity.
    pub require_identity: bool,
    /// Capacity of each connection's outbound queue. A full queue fails the write.
    pub outbound_buffer: usize,
    /// Largest inbound frame accepted, in bytes.
    ///
    /// Unlike a malformed frame, which is dropped, a frame over this limit is
    /// a read error on the socket and closes the connection.
    pub max_message_size: usize,
    /// How often the server pings each client.
    pub ping_interval: Duration,
    /// A client that has not answered a ping for this long is disconnected.
    pub pong_timeout: Duration,
    /// Shared key the web tier presents to issue and revoke sessions.
    /// Session routes reject every request while unset.
    pub session_issuer_key: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 4003,
            channels: vec![
                "chat".to_string(),
                "live-update".to_string(),
                "stats".to_string(),
            ],
            require_identity: true,
            outbound_buffer: 256,
            max_message_size: 64 * 1024,
            ping_interval: Duration::from_secs(54),
            pong_timeout: Duration::from_secs(60),
            session_issuer_key: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            port: parsed(&var, "PORT").unwrap_or(defaults.port),
            channels: var("LIVE_CHANNELS")
                .map(|v| parse_channel_list(&v))
                .unwrap_or(defaults.channels),
            require_identity: var("LIVE_REQUIRE_IDENTITY")
                .and_then(|v| parse_bool(&v))
                .unwrap_or(defaults.require_identity),
            outbound_buffer: parsed(&var, "LIVE_OUTBOUND_BUFFER")
                .filter(|n: &usize| *n > 0)
                .unwrap_or(defaults.outbound_buffer),
            max_message_size: parsed(&var, "LIVE_MAX_MESSAGE_SIZE")
                .unwrap_or(defaults.max_message_size),
            ping_interval: parsed(&var, "LIVE_PING_INTERVAL_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.ping_interval),
            pong_timeout: parsed(&var, "LIVE_PONG_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.pong_timeout),
            session_issuer_key: var("LIVE_SESSION_ISSUER_KEY").filter(|s| !s.is_empty()),
        }
    }
}

fn parsed<T: std::str::FromStr>(var: &impl Fn(&str) -> Option<String>, name: &str) -> Option<T> {
    var(name).and_then(|v| v.trim().parse().ok())
}

fn parse_channel_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
