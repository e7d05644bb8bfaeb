use async_trait::async_trait;
use hush_core::{IceCandidate, PeerId, SessionDescription};

/// Outbound half of the signaling channel as the session manager sees it.
///
/// Implemented by the WebSocket client in production and by capturing mocks in tests.
#[async_trait]
pub trait SignalingOutput: Send + Sync {
    async fn send_offer(&self, target: PeerId, offer: SessionDescription);

    async fn send_answer(&self, target: PeerId, answer: SessionDescription);

    async fn send_candidate(&self, target: PeerId, candidate: IceCandidate);
}
