use dashmap::DashMap;
use hush_core::{Participant, PeerId, RoomCode, RosterSnapshot};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

#[derive(Default)]
struct RoomMembers {
    revision: u64,
    members: BTreeMap<PeerId, String>,
}

impl RoomMembers {
    fn snapshot(&self, room: &RoomCode) -> RosterSnapshot {
        RosterSnapshot {
            room: room.clone(),
            revision: self.revision,
            participants: self
                .members
                .iter()
                .map(|(peer_id, name)| Participant {
                    peer_id: *peer_id,
                    display_name: name.clone(),
                })
                .collect(),
        }
    }
}

/// Per-room membership held by the relay.
///
/// Each room's snapshot is computed under that room's lock, so revisions of one
/// room are strictly increasing and never skipped.
#[derive(Default)]
pub struct RosterTracker {
    rooms: DashMap<RoomCode, RoomMembers>,
    memberships: DashMap<PeerId, BTreeSet<RoomCode>>,
    names: DashMap<PeerId, String>,
}

impl RosterTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `peer_id` to `room` and returns the snapshot every member should get.
    /// Joining again under a new name replaces the name.
    pub fn join(&self, room: &RoomCode, peer_id: PeerId, display_name: String) -> RosterSnapshot {
        self.names.insert(peer_id, display_name.clone());
        self.memberships
            .entry(peer_id)
            .or_default()
            .insert(room.clone());

        let mut entry = self.rooms.entry(room.clone()).or_default();
        entry.members.insert(peer_id, display_name);
        entry.revision += 1;
        entry.snapshot(room)
    }

    /// Removes `peer_id` from every room it joined. Returns the new snapshots of the
    /// rooms that still have members; emptied rooms are dropped.
    pub fn leave(&self, peer_id: &PeerId) -> Vec<RosterSnapshot> {
        self.names.remove(peer_id);
        let Some((_, rooms)) = self.memberships.remove(peer_id) else {
            return Vec::new();
        };

        let mut remaining = Vec::new();
        for room in rooms {
            let emptied = match self.rooms.get_mut(&room) {
                Some(mut entry) => {
                    entry.members.remove(peer_id);
                    entry.revision += 1;
                    if entry.members.is_empty() {
                        true
                    } else {
                        remaining.push(entry.snapshot(&room));
                        false
                    }
                }
                None => false,
            };

            if emptied {
                self.rooms.remove_if(&room, |_, members| members.members.is_empty());
                debug!("Room {} is empty, dropping it", room);
            }
        }
        remaining
    }

    pub fn snapshot(&self, room: &RoomCode) -> Option<RosterSnapshot> {
        self.rooms.get(room).map(|entry| entry.snapshot(room))
    }

    pub fn display_name(&self, peer_id: &PeerId) -> Option<String> {
        self.names.get(peer_id).map(|name| name.clone())
    }

    pub fn rooms_of(&self, peer_id: &PeerId) -> Vec<RoomCode> {
        self.memberships
            .get(peer_id)
            .map(|rooms| rooms.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}
