use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("WebRTC error: {0}")]
    WebRtc(#[from] webrtc::Error),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("Room request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Malformed signal: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Signaling channel closed")]
    SignalingClosed,

    #[error("Session manager stopped")]
    ManagerStopped,

    #[error("Connection error: {0}")]
    Connection(String),
}
