use crate::session::{Role, SessionState, TransitionError};
use crate::transport::ConnectionOp;
use hush_core::{IceCandidate, PeerId, SessionDescription};
use std::collections::VecDeque;
use std::fmt;

/// Unique per manager; tells a live session apart from a destroyed one for the
/// same remote identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Signaling a session wants delivered through the relay.
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundSignal {
    Offer {
        target: PeerId,
        offer: SessionDescription,
    },
    Answer {
        target: PeerId,
        answer: SessionDescription,
    },
    Candidate {
        target: PeerId,
        candidate: IceCandidate,
    },
}

/// What a transition asks the manager to do, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEffect {
    Signal(OutboundSignal),
    Connection(ConnectionOp),
}

type Transition = Result<Vec<SessionEffect>, TransitionError>;

/// Negotiation state machine for one remote participant.
///
/// Pure: every input returns the effects to perform instead of performing them.
/// Two queues keep trickled candidates behind the descriptions they belong to:
/// remote candidates wait until the remote description is applied, local ones
/// until our own description has been signaled.
#[derive(Debug)]
pub struct PeerSession {
    id: SessionId,
    remote: PeerId,
    role: Role,
    state: SessionState,
    pending_remote: VecDeque<IceCandidate>,
    pending_local: VecDeque<IceCandidate>,
    /// Set when glare was resolved in our favor: until the answer arrives,
    /// remote candidates describe the connection the remote is abandoning.
    discard_early_remote: bool,
}

impl PeerSession {
    pub fn initiator(id: SessionId, remote: PeerId) -> Self {
        Self::new(id, remote, Role::Initiator)
    }

    pub fn responder(id: SessionId, remote: PeerId) -> Self {
        Self::new(id, remote, Role::Responder)
    }

    fn new(id: SessionId, remote: PeerId, role: Role) -> Self {
        Self {
            id,
            remote,
            role,
            state: SessionState::Idle,
            pending_remote: VecDeque::new(),
            pending_local: VecDeque::new(),
            discard_early_remote: false,
        }
    }

    /// Seeds the remote candidate queue, e.g. with what an abandoned session
    /// for the same peer had already received.
    pub fn with_queued(mut self, candidates: VecDeque<IceCandidate>) -> Self {
        self.pending_remote = candidates;
        self
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn remote(&self) -> PeerId {
        self.remote
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn queued_candidates(&self) -> usize {
        self.pending_remote.len()
    }

    pub fn take_queued(&mut self) -> VecDeque<IceCandidate> {
        std::mem::take(&mut self.pending_remote)
    }

    /// Glare resolved in our favor: the remote drops its own offer and answers ours.
    /// Discards remote candidates queued so far and any that arrive before the
    /// answer. Returns how many were queued.
    pub fn keep_offer(&mut self) -> usize {
        self.discard_early_remote = true;
        let dropped = self.pending_remote.len();
        self.pending_remote.clear();
        dropped
    }

    /// `Idle -> Offering`: ask the connection for an offer.
    pub fn begin_offer(&mut self) -> Transition {
        self.expect(Role::Initiator, SessionState::Idle, "begin-offer")?;
        self.state = SessionState::Offering;
        Ok(vec![SessionEffect::Connection(ConnectionOp::CreateOffer)])
    }

    /// `Offering -> OfferSent`: the offer exists, send it and anything gathered meanwhile.
    pub fn offer_created(&mut self, offer: SessionDescription) -> Transition {
        self.expect(Role::Initiator, SessionState::Offering, "offer-created")?;
        self.state = SessionState::OfferSent;

        let mut effects = vec![SessionEffect::Signal(OutboundSignal::Offer {
            target: self.remote,
            offer,
        })];
        effects.extend(self.release_local());
        Ok(effects)
    }

    /// `Idle -> OfferReceived`: hand the remote offer to the connection.
    pub fn receive_offer(&mut self, offer: SessionDescription) -> Transition {
        self.expect(Role::Responder, SessionState::Idle, "offer")?;
        self.state = SessionState::OfferReceived;
        Ok(vec![SessionEffect::Connection(ConnectionOp::AcceptOffer(offer))])
    }

    /// `OfferReceived -> AnswerSent`: send the answer, then flush queued candidates.
    pub fn answer_created(&mut self, answer: SessionDescription) -> Transition {
        self.expect(Role::Responder, SessionState::OfferReceived, "answer-created")?;
        self.state = SessionState::AnswerSent;

        let mut effects = vec![SessionEffect::Signal(OutboundSignal::Answer {
            target: self.remote,
            answer,
        })];
        effects.extend(self.release_local());
        effects.extend(self.flush_remote());
        Ok(effects)
    }

    /// `OfferSent -> Connected`: apply the answer, then flush queued candidates.
    /// The connection applies operations in order, so the flush lands after the answer.
    pub fn receive_answer(&mut self, answer: SessionDescription) -> Transition {
        self.expect(Role::Initiator, SessionState::OfferSent, "answer")?;
        self.state = SessionState::Connected;
        self.discard_early_remote = false;

        let mut effects = vec![SessionEffect::Connection(ConnectionOp::ApplyAnswer(answer))];
        effects.extend(self.flush_remote());
        Ok(effects)
    }

    /// `AnswerSent -> Connected` once the transport reports the path is up.
    pub fn connection_established(&mut self) -> Transition {
        match self.state {
            SessionState::AnswerSent => {
                self.state = SessionState::Connected;
                Ok(Vec::new())
            }
            SessionState::Connected => Ok(Vec::new()),
            _ => Err(self.reject("connection-established")),
        }
    }

    /// Applies a remote candidate now, or queues it behind the remote description.
    pub fn receive_candidate(&mut self, candidate: IceCandidate) -> Transition {
        if self.state == SessionState::Closed {
            return Err(self.reject("candidate"));
        }
        if self.state.accepts_remote_candidates() {
            return Ok(vec![SessionEffect::Connection(ConnectionOp::AddCandidate(
                candidate,
            ))]);
        }
        if !self.discard_early_remote {
            self.pending_remote.push_back(candidate);
        }
        Ok(Vec::new())
    }

    /// Sends a locally gathered candidate, or holds it until our description is out.
    pub fn local_candidate(&mut self, candidate: IceCandidate) -> Transition {
        if self.state == SessionState::Closed {
            return Err(self.reject("local-candidate"));
        }
        if self.state.sends_local_candidates() {
            return Ok(vec![SessionEffect::Signal(OutboundSignal::Candidate {
                target: self.remote,
                candidate,
            })]);
        }
        self.pending_local.push_back(candidate);
        Ok(Vec::new())
    }

    /// Moves to `Closed` and discards both queues. Returns the number of remote
    /// candidates that were never applied.
    pub fn close(&mut self) -> usize {
        self.state = SessionState::Closed;
        self.pending_local.clear();
        let dropped = self.pending_remote.len();
        self.pending_remote.clear();
        dropped
    }

    fn flush_remote(&mut self) -> impl Iterator<Item = SessionEffect> + use<> {
        std::mem::take(&mut self.pending_remote)
            .into_iter()
            .map(|c| SessionEffect::Connection(ConnectionOp::AddCandidate(c)))
    }

    fn release_local(&mut self) -> impl Iterator<Item = SessionEffect> + use<> {
        let target = self.remote;
        std::mem::take(&mut self.pending_local)
            .into_iter()
            .map(move |candidate| SessionEffect::Signal(OutboundSignal::Candidate { target, candidate }))
    }

    fn expect(&self, role: Role, state: SessionState, event: &'static str) -> Result<(), TransitionError> {
        if self.role == role && self.state == state {
            Ok(())
        } else {
            Err(self.reject(event))
        }
    }

    fn reject(&self, event: &'static str) -> TransitionError {
        TransitionError {
            role: self.role,
            state: self.state,
            event,
        }
    }
}
