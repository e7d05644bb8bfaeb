use crate::roster::RosterTracker;
use crate::signaling::{PeerPayload, SignalingRelay};
use axum::extract::ws::Message;
use hush_core::{ClientSignal, IceServerConfig, PeerId, RelaySignal, RoomCode, RosterSnapshot};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};

struct SignalingInner {
    relay: SignalingRelay,
    roster: RosterTracker,
    ice_servers: Vec<IceServerConfig>,
}

/// Relay-side state shared by every socket task.
#[derive(Clone)]
pub struct SignalingService {
    inner: Arc<SignalingInner>,
}

impl SignalingService {
    pub fn new(ice_servers: Vec<IceServerConfig>) -> Self {
        Self {
            inner: Arc::new(SignalingInner {
                relay: SignalingRelay::new(),
                roster: RosterTracker::new(),
                ice_servers,
            }),
        }
    }

    pub fn get_ice_servers(&self) -> Vec<IceServerConfig> {
        self.inner.ice_servers.clone()
    }

    pub fn roster(&self) -> &RosterTracker {
        &self.inner.roster
    }

    pub fn relay(&self) -> &SignalingRelay {
        &self.inner.relay
    }

    /// Assigns an identity to a fresh socket and greets it with `Welcome` and `IceConfig`.
    pub fn connect(&self, tx: mpsc::UnboundedSender<Message>) -> PeerId {
        let peer_id = PeerId::new();
        self.inner.relay.register(peer_id, tx);

        self.inner.relay.send(&peer_id, &RelaySignal::Welcome { peer_id });
        self.inner.relay.send(
            &peer_id,
            &RelaySignal::IceConfig {
                ice_servers: self.get_ice_servers(),
            },
        );
        peer_id
    }

    /// Socket gone: drop it from every room and tell whoever is left.
    pub fn disconnect(&self, peer_id: &PeerId) {
        self.inner.relay.unregister(peer_id);
        for snapshot in self.inner.roster.leave(peer_id) {
            info!(
                "Peer {} left room {}, {} remaining",
                peer_id.short(),
                snapshot.room,
                snapshot.len()
            );
            self.broadcast_roster(snapshot);
        }
    }

    pub fn handle_signal(&self, from: PeerId, signal: ClientSignal) {
        match signal {
            ClientSignal::Join { room, display_name } => self.join(from, room, display_name),
            ClientSignal::SendText { room, text } => self.relay_text(from, &room, text),
            ClientSignal::Offer { target, offer } => {
                self.inner
                    .relay
                    .forward(from, target, PeerPayload::Offer(offer));
            }
            ClientSignal::Answer { target, answer } => {
                self.inner
                    .relay
                    .forward(from, target, PeerPayload::Answer(answer));
            }
            ClientSignal::IceCandidate { target, candidate } => {
                self.inner
                    .relay
                    .forward(from, target, PeerPayload::Candidate(candidate));
            }
        }
    }

    fn join(&self, peer_id: PeerId, room: RoomCode, display_name: String) {
        info!(
            "Peer {} ({}) joined room {}",
            peer_id.short(),
            display_name,
            room
        );
        let snapshot = self.inner.roster.join(&room, peer_id, display_name);
        self.broadcast_roster(snapshot);
    }

    fn relay_text(&self, from: PeerId, room: &RoomCode, text: String) {
        let Some(snapshot) = self.inner.roster.snapshot(room) else {
            debug!("Text for empty room {} from {} dropped", room, from.short());
            return;
        };
        let author_name = self
            .inner
            .roster
            .display_name(&from)
            .unwrap_or_else(|| from.to_string());

        let msg = RelaySignal::NewMessage {
            room: room.clone(),
            author_name,
            text,
        };
        let members: Vec<PeerId> = snapshot.participants.iter().map(|p| p.peer_id).collect();
        self.inner.relay.broadcast(&members, &msg);
    }

    fn broadcast_roster(&self, snapshot: RosterSnapshot) {
        let members: Vec<PeerId> = snapshot.participants.iter().map(|p| p.peer_id).collect();
        self.inner
            .relay
            .broadcast(&members, &RelaySignal::RosterUpdate { snapshot });
    }
}
