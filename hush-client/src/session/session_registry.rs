use crate::session::{PeerSession, Role, SessionId, SessionState};
use crate::transport::{ConnectionHandle, ConnectionOp};
use hush_core::PeerId;
use std::collections::{BTreeSet, HashMap};

/// A registered session together with the worker owning its connection.
#[derive(Debug)]
pub struct LiveSession {
    pub session: PeerSession,
    connection: ConnectionHandle,
}

impl LiveSession {
    pub fn new(session: PeerSession, connection: ConnectionHandle) -> Self {
        Self {
            session,
            connection,
        }
    }

    pub fn submit(&self, op: ConnectionOp) {
        self.connection.submit(op);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub peer_id: PeerId,
    pub role: Role,
    pub state: SessionState,
    pub queued_candidates: usize,
}

/// Live sessions of one participant, at most one per remote identity.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: HashMap<PeerId, LiveSession>,
    next_id: u64,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ids are never reused, so late completions of a destroyed session can be recognized.
    pub fn allocate_id(&mut self) -> SessionId {
        self.next_id += 1;
        SessionId(self.next_id)
    }

    /// Registers a session unless its remote already has one.
    /// A rejected entry is dropped, which releases its connection.
    pub fn insert(&mut self, live: LiveSession) -> bool {
        let remote = live.session.remote();
        if self.sessions.contains_key(&remote) {
            return false;
        }
        self.sessions.insert(remote, live);
        true
    }

    pub fn get(&self, remote: &PeerId) -> Option<&LiveSession> {
        self.sessions.get(remote)
    }

    pub fn get_mut(&mut self, remote: &PeerId) -> Option<&mut LiveSession> {
        self.sessions.get_mut(remote)
    }

    pub fn is_current(&self, remote: &PeerId, id: SessionId) -> bool {
        self.sessions
            .get(remote)
            .is_some_and(|live| live.session.id() == id)
    }

    pub fn remove(&mut self, remote: &PeerId) -> Option<LiveSession> {
        self.sessions.remove(remote)
    }

    pub fn contains(&self, remote: &PeerId) -> bool {
        self.sessions.contains_key(remote)
    }

    pub fn remotes(&self) -> BTreeSet<PeerId> {
        self.sessions.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LiveSession> {
        self.sessions.values()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn summaries(&self) -> Vec<SessionSummary> {
        let mut summaries: Vec<SessionSummary> = self
            .sessions
            .values()
            .map(|live| SessionSummary {
                peer_id: live.session.remote(),
                role: live.session.role(),
                state: live.session.state(),
                queued_candidates: live.session.queued_candidates(),
            })
            .collect();
        summaries.sort_by_key(|s| s.peer_id);
        summaries
    }
}
