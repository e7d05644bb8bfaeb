use crate::session::SessionId;
use hush_core::{IceCandidate, PeerId, SessionDescription};
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionEventKind {
    OfferCreated(SessionDescription),
    AnswerCreated(SessionDescription),
    LocalCandidate(IceCandidate),
    Connected,
    /// Offer, answer, or connection creation failed. The session cannot continue.
    NegotiationFailed(String),
    /// Failed, closed, or disconnected at the transport level.
    Lost,
    /// Media from the remote peer started arriving.
    RemoteTrack,
    CandidateRejected(String),
    MediaRejected(String),
}

/// Something a connection reported, tagged with the session it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionEvent {
    pub remote: PeerId,
    pub session: SessionId,
    pub kind: ConnectionEventKind,
}

/// Sending half handed to one connection and its worker.
#[derive(Debug, Clone)]
pub struct ConnectionEvents {
    remote: PeerId,
    session: SessionId,
    tx: mpsc::Sender<ConnectionEvent>,
}

impl ConnectionEvents {
    pub fn new(remote: PeerId, session: SessionId, tx: mpsc::Sender<ConnectionEvent>) -> Self {
        Self {
            remote,
            session,
            tx,
        }
    }

    pub fn remote(&self) -> PeerId {
        self.remote
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    /// Delivers to the manager. A manager that has shut down is not an error.
    pub async fn emit(&self, kind: ConnectionEventKind) {
        let event = ConnectionEvent {
            remote: self.remote,
            session: self.session,
            kind,
        };
        let _ = self.tx.send(event).await;
    }
}
