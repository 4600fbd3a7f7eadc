//! Real-time WebSocket engine configuration.

use serde::{Deserialize, Serialize};

/// Real-time (WebSocket) engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Per-connection outbound queue capacity. A full queue drops events
    /// for that connection only.
    #[serde(default = "default_outbound_buffer")]
    pub outbound_buffer_size: usize,
    /// WebSocket ping interval in seconds.
    #[serde(default = "default_ping_interval")]
    pub ping_interval_seconds: u64,
    /// Seconds without a pong before the transport is considered dead.
    #[serde(default = "default_ping_timeout")]
    pub ping_timeout_seconds: u64,
    /// Largest inbound text frame accepted, in bytes.
    #[serde(default = "default_max_frame")]
    pub max_inbound_frame_bytes: usize,
    /// Default number of messages returned by a conversation fetch.
    #[serde(default = "default_page_limit")]
    pub conversation_page_limit: i64,
    /// Reject auth handshakes for identities unknown to the store.
    #[serde(default = "default_true")]
    pub verify_user_on_auth: bool,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            outbound_buffer_size: default_outbound_buffer(),
            ping_interval_seconds: default_ping_interval(),
            ping_timeout_seconds: default_ping_timeout(),
            max_inbound_frame_bytes: default_max_frame(),
            conversation_page_limit: default_page_limit(),
            verify_user_on_auth: true,
        }
    }
}

fn default_outbound_buffer() -> usize {
    256
}

fn default_ping_interval() -> u64 {
    30
}

fn default_ping_timeout() -> u64 {
    75
}

fn default_max_frame() -> usize {
    16 * 1024
}

fn default_page_limit() -> i64 {
    50
}

fn default_true() -> bool {
    true
}
