use hush_core::RoomCode;
use std::time::Duration;

pub const DEFAULT_SERVER_URL: &str = "http://localhost:4000";
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Relay base address. `http(s)://` is mapped to `ws(s)://`.
    pub server_url: String,
    pub room: RoomCode,
    pub display_name: String,
    /// How long to wait for `Welcome` and `IceConfig` after connecting.
    pub handshake_timeout: Duration,
}

impl ClientConfig {
    pub fn new(server_url: impl Into<String>, room: RoomCode, display_name: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
            room,
            display_name: display_name.into(),
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
        }
    }

    /// WebSocket endpoint of the relay.
    pub fn ws_url(&self) -> String {
        let base = self.server_url.trim_end_matches('/');
        let base = if let Some(rest) = base.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = base.strip_prefix("http://") {
            format!("ws://{rest}")
        } else if base.starts_with("ws://") || base.starts_with("wss://") {
            base.to_owned()
        } else {
            format!("ws://{base}")
        };

        if base.ends_with("/ws") {
            base
        } else {
            format!("{base}/ws")
        }
    }
}

/// HTTP base of a relay address, for the room endpoints.
pub fn http_base_url(server_url: &str) -> String {
    let base = server_url.trim_end_matches('/');
    let base = base.strip_suffix("/ws").unwrap_or(base);
    if let Some(rest) = base.strip_prefix("wss://") {
        format!("https://{rest}")
    } else if let Some(rest) = base.strip_prefix("ws://") {
        format!("http://{rest}")
    } else if base.starts_with("http://") || base.starts_with("https://") {
        base.to_owned()
    } else {
        format!("http://{base}")
    }
}
