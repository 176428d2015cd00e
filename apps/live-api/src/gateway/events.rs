//! Pub/sub request types and wire-format envelopes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

pub const TYPE_SUBSCRIBE: &str = "subscribe";
pub const TYPE_UNSUBSCRIBE: &str = "unsubscribe";
pub const TYPE_MESSAGE: &str = "message";

// ---------------------------------------------------------------------------
// Client → Server message
// ---------------------------------------------------------------------------

/// A frame received from the client over WebSocket.
///
/// `payload` is opaque to the core and only meaningful for `message`
/// requests, where the whole envelope is handed to the channel's hook.
#[derive(Debug, Clone, Deserialize)]
pub struct InboundMessage {
    #[serde(rename = "type")]
    pub kind: String,
    pub channel: String,
    #[serde(default)]
    pub payload: Value,
}

impl InboundMessage {
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

// ---------------------------------------------------------------------------
// Server → Client message
// ---------------------------------------------------------------------------

/// A message pushed from the server to every subscriber of `channel`.
#[derive(Debug, Serialize)]
pub struct OutboundMessage<'a> {
    pub channel: &'a str,
    pub payload: &'a Value,
}

impl<'a> OutboundMessage<'a> {
    pub fn new(channel: &'a str, payload: &'a Value) -> Self {
        Self { channel, payload }
    }

    /// Serialize once; the result is shared by every recipient.
    pub fn to_frame(&self) -> String {
        // Serializing a `Value` behind string keys cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }
}
