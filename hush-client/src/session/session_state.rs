use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Initiator,
    Responder,
}

/// Negotiation progress of one peer pair.
///
/// Initiator: `Idle -> Offering -> OfferSent -> Connected`.
/// Responder: `Idle -> OfferReceived -> AnswerSent -> Connected`.
/// `Closed` is terminal and reachable from anywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    Idle,
    Offering,
    OfferSent,
    OfferReceived,
    AnswerSent,
    Connected,
    Closed,
}

impl SessionState {
    /// Negotiation finished one way or the other.
    pub fn is_settled(self) -> bool {
        matches!(self, SessionState::Connected | SessionState::Closed)
    }

    /// The remote description is applied, so remote candidates can be added.
    pub fn accepts_remote_candidates(self) -> bool {
        matches!(self, SessionState::AnswerSent | SessionState::Connected)
    }

    /// Our own description has gone out, so our candidates may follow it.
    pub fn sends_local_candidates(self) -> bool {
        matches!(
            self,
            SessionState::OfferSent | SessionState::AnswerSent | SessionState::Connected
        )
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Idle => "idle",
            SessionState::Offering => "offering",
            SessionState::OfferSent => "offer-sent",
            SessionState::OfferReceived => "offer-received",
            SessionState::AnswerSent => "answer-sent",
            SessionState::Connected => "connected",
            SessionState::Closed => "closed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{role:?} session in state {state} cannot handle {event}")]
pub struct TransitionError {
    pub role: Role,
    pub state: SessionState,
    pub event: &'static str,
}
