use crate::model::{PeerId, RoomCode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub peer_id: PeerId,
    pub display_name: String,
}

/// Authoritative membership of a room at one point in time.
///
/// Receivers reconcile against the whole snapshot; it is never a delta.
/// `revision` grows by one with every membership change of the room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterSnapshot {
    pub room: RoomCode,
    pub revision: u64,
    pub participants: Vec<Participant>,
}

impl RosterSnapshot {
    pub fn contains(&self, peer_id: &PeerId) -> bool {
        self.participants.iter().any(|p| &p.peer_id == peer_id)
    }

    /// Everyone in the snapshot except `local`.
    pub fn remote_peers(&self, local: &PeerId) -> BTreeSet<PeerId> {
        self.participants
            .iter()
            .map(|p| p.peer_id)
            .filter(|id| id != local)
            .collect()
    }

    pub fn display_name(&self, peer_id: &PeerId) -> Option<&str> {
        self.participants
            .iter()
            .find(|p| &p.peer_id == peer_id)
            .map(|p| p.display_name.as_str())
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }
}
