use crate::media::LocalMedia;
use crate::session::{Role, SessionState, SessionSummary};
use hush_core::{IceCandidate, PeerId, RosterSnapshot, SessionDescription};
use tokio::sync::oneshot;

/// Inputs to the session manager, in the order they arrived from the relay or the user.
#[derive(Debug)]
pub enum SessionCommand {
    RosterUpdate(RosterSnapshot),

    RemoteOffer {
        from: PeerId,
        offer: SessionDescription,
    },

    RemoteAnswer {
        from: PeerId,
        answer: SessionDescription,
    },

    RemoteCandidate {
        from: PeerId,
        candidate: IceCandidate,
    },

    /// Local audio became available. Attached to every session from now on.
    StartMedia(LocalMedia),

    Inspect(oneshot::Sender<Vec<SessionSummary>>),

    /// Close every session and stop the manager.
    Shutdown,
}

/// Published whenever a session is created, changes state, or is destroyed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUpdate {
    pub peer_id: PeerId,
    pub role: Role,
    pub state: SessionState,
}
