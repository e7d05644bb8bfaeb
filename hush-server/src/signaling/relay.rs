use axum::extract::ws::Message;
use dashmap::DashMap;
use hush_core::{IceCandidate, PeerId, RelaySignal, SessionDescription};
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

/// Peer-to-peer payloads the relay forwards without looking inside.
#[derive(Debug, Clone)]
pub enum PeerPayload {
    Offer(SessionDescription),
    Answer(SessionDescription),
    Candidate(IceCandidate),
}

impl PeerPayload {
    fn kind(&self) -> &'static str {
        match self {
            PeerPayload::Offer(_) => "offer",
            PeerPayload::Answer(_) => "answer",
            PeerPayload::Candidate(_) => "candidate",
        }
    }

    fn into_signal(self, from: PeerId) -> RelaySignal {
        match self {
            PeerPayload::Offer(offer) => RelaySignal::Offer { from, offer },
            PeerPayload::Answer(answer) => RelaySignal::Answer { from, answer },
            PeerPayload::Candidate(candidate) => RelaySignal::IceCandidate { from, candidate },
        }
    }
}

/// Outbound half of every connected socket, keyed by the identity it was given.
///
/// Delivery is fire-and-forget: nothing is retried or buffered here.
#[derive(Default)]
pub struct SignalingRelay {
    peers: DashMap<PeerId, mpsc::UnboundedSender<Message>>,
}

impl SignalingRelay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, peer_id: PeerId, tx: mpsc::UnboundedSender<Message>) {
        self.peers.insert(peer_id, tx);
    }

    pub fn unregister(&self, peer_id: &PeerId) {
        self.peers.remove(peer_id);
    }

    pub fn connected(&self) -> usize {
        self.peers.len()
    }

    /// Unicasts `payload` to `target`, stamped with the sender identity.
    pub fn forward(&self, from: PeerId, target: PeerId, payload: PeerPayload) -> bool {
        debug!("Relaying {} {} -> {}", payload.kind(), from.short(), target.short());
        self.send(&target, &payload.into_signal(from))
    }

    pub fn send(&self, peer_id: &PeerId, msg: &RelaySignal) -> bool {
        match serde_json::to_string(msg) {
            Ok(json) => self.send_text(peer_id, json),
            Err(e) => {
                error!("Failed to serialize signal message: {}", e);
                false
            }
        }
    }

    /// Sends one serialized copy of `msg` to each of `targets`.
    pub fn broadcast<'a>(&self, targets: impl IntoIterator<Item = &'a PeerId>, msg: &RelaySignal) {
        let json = match serde_json::to_string(msg) {
            Ok(json) => json,
            Err(e) => {
                error!("Failed to serialize signal message: {}", e);
                return;
            }
        };
        for peer_id in targets {
            self.send_text(peer_id, json.clone());
        }
    }

    fn send_text(&self, peer_id: &PeerId, json: String) -> bool {
        let Some(peer) = self.peers.get(peer_id) else {
            warn!("Attempted to send signal to disconnected user {}", peer_id);
            return false;
        };
        if let Err(e) = peer.send(Message::Text(json.into())) {
            error!("Failed to send WS message to {}: {:?}", peer_id, e);
            return false;
        }
        true
    }
}
