use async_trait::async_trait;
use hush_client::{SessionManagerHandle, SignalingOutput};
use hush_core::{IceCandidate, PeerId, SessionDescription};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// In-memory stand-in for the relay: routes signals straight into the
/// target's session manager, in send order.
#[derive(Clone, Default)]
pub struct MeshRelay {
    managers: Arc<Mutex<HashMap<PeerId, SessionManagerHandle>>>,
}

impl MeshRelay {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, peer_id: PeerId, handle: SessionManagerHandle) {
        self.managers.lock().await.insert(peer_id, handle);
    }

    /// Signaling output for the participant `from`.
    pub fn link(&self, from: PeerId) -> Arc<dyn SignalingOutput> {
        Arc::new(MeshLink {
            from,
            relay: self.clone(),
        })
    }

    async fn target(&self, target: &PeerId) -> Option<SessionManagerHandle> {
        self.managers.lock().await.get(target).cloned()
    }
}

struct MeshLink {
    from: PeerId,
    relay: MeshRelay,
}

#[async_trait]
impl SignalingOutput for MeshLink {
    async fn send_offer(&self, target: PeerId, offer: SessionDescription) {
        if let Some(handle) = self.relay.target(&target).await {
            let _ = handle.remote_offer(self.from, offer);
        }
    }

    async fn send_answer(&self, target: PeerId, answer: SessionDescription) {
        if let Some(handle) = self.relay.target(&target).await {
            let _ = handle.remote_answer(self.from, answer);
        }
    }

    async fn send_candidate(&self, target: PeerId, candidate: IceCandidate) {
        if let Some(handle) = self.relay.target(&target).await {
            let _ = handle.remote_candidate(self.from, candidate);
        }
    }
}
