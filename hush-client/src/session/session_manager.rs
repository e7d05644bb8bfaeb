use crate::SessionError;
use crate::media::LocalMedia;
use crate::session::{
    LiveSession, OutboundSignal, PeerSession, Role, SessionCommand, SessionEffect,
    SessionRegistry, SessionState, SessionSummary, SessionUpdate, TransitionError,
};
use crate::signaling::SignalingOutput;
use crate::transport::{
    ConnectionEvent, ConnectionEventKind, ConnectionEvents, ConnectionFactory, ConnectionHandle,
    ConnectionOp, spawn_worker,
};
use hush_core::{IceCandidate, PeerId, RosterSnapshot, SessionDescription};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Client-side actor owning every peer session of one participant.
///
/// The latest roster snapshot decides who should have a session; incoming
/// signaling and connection events drive the individual state machines.
/// Everything runs on one task, so registry access needs no locking.
pub struct PeerSessionManager {
    local: PeerId,
    registry: SessionRegistry,
    roster: Option<RosterSnapshot>,
    media: Option<LocalMedia>,

    factory: Arc<dyn ConnectionFactory>,
    signaling: Arc<dyn SignalingOutput>,

    command_rx: mpsc::UnboundedReceiver<SessionCommand>,

    /// Completions and transport reports from every connection worker.
    event_rx: mpsc::Receiver<ConnectionEvent>,
    event_tx: mpsc::Sender<ConnectionEvent>,

    updates: mpsc::UnboundedSender<SessionUpdate>,
}

impl PeerSessionManager {
    /// Starts the manager on its own task.
    pub fn spawn(
        local: PeerId,
        factory: Arc<dyn ConnectionFactory>,
        signaling: Arc<dyn SignalingOutput>,
    ) -> (SessionManagerHandle, mpsc::UnboundedReceiver<SessionUpdate>) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let (updates_tx, updates_rx) = mpsc::unbounded_channel();

        let manager = Self {
            local,
            registry: SessionRegistry::new(),
            roster: None,
            media: None,
            factory,
            signaling,
            command_rx,
            event_rx,
            event_tx,
            updates: updates_tx,
        };
        tokio::spawn(manager.run());

        (SessionManagerHandle { tx: command_tx }, updates_rx)
    }

    async fn run(mut self) {
        info!("Session manager for {} started", self.local.short());

        loop {
            tokio::select! {
                cmd = self.command_rx.recv() => match cmd {
                    Some(SessionCommand::Shutdown) | None => break,
                    Some(cmd) => self.handle_command(cmd).await,
                },
                Some(event) = self.event_rx.recv() => self.handle_connection_event(event).await,
            }
        }

        self.close_all();
        info!("Session manager for {} stopped", self.local.short());
    }

    async fn handle_command(&mut self, cmd: SessionCommand) {
        match cmd {
            SessionCommand::RosterUpdate(snapshot) => self.apply_roster(snapshot).await,

            SessionCommand::RemoteOffer { from, offer } => self.on_remote_offer(from, offer).await,

            SessionCommand::RemoteAnswer { from, answer } => {
                if !self.registry.contains(&from) {
                    debug!("Answer from {} without a session, dropped", from.short());
                    return;
                }
                self.transition(from, |s| s.receive_answer(answer)).await;
            }

            SessionCommand::RemoteCandidate { from, candidate } => {
                if !self.registry.contains(&from) {
                    warn!("Candidate from {} without a session, dropped", from.short());
                    return;
                }
                self.transition(from, |s| s.receive_candidate(candidate)).await;
            }

            SessionCommand::StartMedia(media) => self.start_media(media).await,

            SessionCommand::Inspect(reply) => {
                let _ = reply.send(self.registry.summaries());
            }

            SessionCommand::Shutdown => {}
        }
    }

    async fn apply_roster(&mut self, snapshot: RosterSnapshot) {
        if let Some(current) = &self.roster
            && current.room == snapshot.room
            && snapshot.revision < current.revision
        {
            debug!(
                "Stale roster revision {} for {} (have {}), ignored",
                snapshot.revision, snapshot.room, current.revision
            );
            return;
        }
        self.roster = Some(snapshot);
        self.reconcile().await;
    }

    async fn start_media(&mut self, media: LocalMedia) {
        if self.media.is_some() {
            debug!("Local media already active");
            return;
        }
        for live in self.registry.iter() {
            live.submit(ConnectionOp::AttachMedia(media.clone()));
        }
        self.media = Some(media);
        info!("Local media active, {} sessions updated", self.registry.len());
        self.reconcile().await;
    }

    /// Brings the registry in line with the roster: destroy extra, create missing.
    async fn reconcile(&mut self) {
        let Some(roster) = &self.roster else {
            return;
        };
        let desired = roster.remote_peers(&self.local);

        let extra: Vec<PeerId> = self
            .registry
            .remotes()
            .difference(&desired)
            .copied()
            .collect();
        for remote in extra {
            self.destroy(remote, "left the roster");
        }

        if self.media.is_none() {
            debug!("No local media yet, not initiating sessions");
            return;
        }

        let missing: Vec<PeerId> = desired
            .difference(&self.registry.remotes())
            .copied()
            .collect();
        for remote in missing {
            self.initiate(remote).await;
        }
    }

    async fn initiate(&mut self, remote: PeerId) {
        let id = self.registry.allocate_id();
        let mut session = PeerSession::initiator(id, remote);
        let effects = match session.begin_offer() {
            Ok(effects) => effects,
            Err(e) => {
                warn!("Cannot initiate with {}: {}", remote.short(), e);
                return;
            }
        };

        info!("Initiating session {} with {}", id, remote.short());
        let connection = self.open_connection(remote, &session);
        self.register(session, connection, effects).await;
    }

    /// Offer handling including glare: when both sides initiated, the lower
    /// identity keeps its offer and the higher one yields and answers.
    async fn on_remote_offer(&mut self, from: PeerId, offer: SessionDescription) {
        if from == self.local {
            warn!("Offer from our own identity, dropped");
            return;
        }

        let existing = self
            .registry
            .get(&from)
            .map(|live| (live.session.role(), live.session.state()));

        match existing {
            None => self.accept_offer(from, offer, VecDeque::new()).await,

            Some((Role::Initiator, state)) if !state.is_settled() => {
                if self.local < from {
                    let dropped = self
                        .registry
                        .get_mut(&from)
                        .map(|live| live.session.keep_offer())
                        .unwrap_or_default();
                    info!(
                        "Glare with {}: keeping our offer ({} stale candidates dropped)",
                        from.short(),
                        dropped
                    );
                    return;
                }
                info!("Glare with {}: yielding to their offer", from.short());
                let carried = self
                    .registry
                    .remove(&from)
                    .map(|mut live| live.session.take_queued())
                    .unwrap_or_default();
                self.accept_offer(from, offer, carried).await;
            }

            Some((role, state)) => {
                debug!(
                    "Offer from {} for {:?} session in {}, dropped",
                    from.short(),
                    role,
                    state
                );
            }
        }
    }

    async fn accept_offer(
        &mut self,
        from: PeerId,
        offer: SessionDescription,
        carried: VecDeque<IceCandidate>,
    ) {
        let id = self.registry.allocate_id();
        let mut session = PeerSession::responder(id, from).with_queued(carried);
        let effects = match session.receive_offer(offer) {
            Ok(effects) => effects,
            Err(e) => {
                warn!("Cannot answer {}: {}", from.short(), e);
                return;
            }
        };

        info!("Answering {} in session {}", from.short(), id);
        let connection = self.open_connection(from, &session);
        self.register(session, connection, effects).await;
    }

    fn open_connection(&self, remote: PeerId, session: &PeerSession) -> ConnectionHandle {
        let events = ConnectionEvents::new(remote, session.id(), self.event_tx.clone());
        spawn_worker(Arc::clone(&self.factory), events, self.media.clone())
    }

    async fn register(
        &mut self,
        session: PeerSession,
        connection: ConnectionHandle,
        effects: Vec<SessionEffect>,
    ) {
        let remote = session.remote();
        if !self.registry.insert(LiveSession::new(session, connection)) {
            warn!("Session with {} already exists, new one discarded", remote.short());
            return;
        }
        self.publish(remote);
        self.apply(remote, effects).await;
    }

    async fn handle_connection_event(&mut self, event: ConnectionEvent) {
        let remote = event.remote;
        if !self.registry.is_current(&remote, event.session) {
            debug!(
                "Stale event from session {} with {}: {:?}",
                event.session,
                remote.short(),
                event.kind
            );
            return;
        }

        match event.kind {
            ConnectionEventKind::OfferCreated(offer) => {
                self.transition(remote, |s| s.offer_created(offer)).await;
            }
            ConnectionEventKind::AnswerCreated(answer) => {
                self.transition(remote, |s| s.answer_created(answer)).await;
            }
            ConnectionEventKind::LocalCandidate(candidate) => {
                self.transition(remote, |s| s.local_candidate(candidate)).await;
            }
            ConnectionEventKind::Connected => {
                info!("Peer connection with {} established", remote.short());
                self.transition(remote, |s| s.connection_established()).await;
            }
            ConnectionEventKind::NegotiationFailed(reason) => {
                warn!("Negotiation with {} failed: {}", remote.short(), reason);
                self.destroy(remote, "negotiation failed");
            }
            ConnectionEventKind::Lost => self.destroy(remote, "connection lost"),
            ConnectionEventKind::RemoteTrack => {
                info!("Receiving media from {}", remote.short());
            }
            ConnectionEventKind::CandidateRejected(reason) => {
                warn!("Candidate from {} rejected: {}", remote.short(), reason);
            }
            ConnectionEventKind::MediaRejected(reason) => {
                warn!("Could not attach media for {}: {}", remote.short(), reason);
            }
        }
    }

    /// Runs one state machine input and performs the resulting effects.
    async fn transition<F>(&mut self, remote: PeerId, input: F)
    where
        F: FnOnce(&mut PeerSession) -> Result<Vec<SessionEffect>, TransitionError>,
    {
        let Some(live) = self.registry.get_mut(&remote) else {
            return;
        };
        let before = live.session.state();

        match input(&mut live.session) {
            Ok(effects) => {
                let changed = live.session.state() != before;
                self.apply(remote, effects).await;
                if changed {
                    self.publish(remote);
                }
            }
            Err(e) => debug!("Dropped input for {}: {}", remote.short(), e),
        }
    }

    async fn apply(&self, remote: PeerId, effects: Vec<SessionEffect>) {
        for effect in effects {
            match effect {
                SessionEffect::Signal(signal) => self.send_signal(signal).await,
                SessionEffect::Connection(op) => match self.registry.get(&remote) {
                    Some(live) => live.submit(op),
                    None => debug!("{} for {} dropped, session gone", op.kind(), remote.short()),
                },
            }
        }
    }

    async fn send_signal(&self, signal: OutboundSignal) {
        match signal {
            OutboundSignal::Offer { target, offer } => {
                self.signaling.send_offer(target, offer).await;
            }
            OutboundSignal::Answer { target, answer } => {
                self.signaling.send_answer(target, answer).await;
            }
            OutboundSignal::Candidate { target, candidate } => {
                self.signaling.send_candidate(target, candidate).await;
            }
        }
    }

    /// Removes the session. Dropping it cancels the worker and closes the connection.
    fn destroy(&mut self, remote: PeerId, reason: &str) {
        let Some(mut live) = self.registry.remove(&remote) else {
            return;
        };
        let role = live.session.role();
        let discarded = live.session.close();
        info!(
            "Session {} with {} closed: {} ({} queued candidates discarded)",
            live.session.id(),
            remote.short(),
            reason,
            discarded
        );

        let _ = self.updates.send(SessionUpdate {
            peer_id: remote,
            role,
            state: SessionState::Closed,
        });
    }

    fn close_all(&mut self) {
        for remote in self.registry.remotes() {
            self.destroy(remote, "shutting down");
        }
    }

    fn publish(&self, remote: PeerId) {
        let Some(live) = self.registry.get(&remote) else {
            return;
        };
        let _ = self.updates.send(SessionUpdate {
            peer_id: remote,
            role: live.session.role(),
            state: live.session.state(),
        });
    }
}

/// Cloneable front door to a running [`PeerSessionManager`].
#[derive(Clone)]
pub struct SessionManagerHandle {
    tx: mpsc::UnboundedSender<SessionCommand>,
}

impl SessionManagerHandle {
    pub fn roster_update(&self, snapshot: RosterSnapshot) -> Result<(), SessionError> {
        self.send(SessionCommand::RosterUpdate(snapshot))
    }

    pub fn remote_offer(&self, from: PeerId, offer: SessionDescription) -> Result<(), SessionError> {
        self.send(SessionCommand::RemoteOffer { from, offer })
    }

    pub fn remote_answer(
        &self,
        from: PeerId,
        answer: SessionDescription,
    ) -> Result<(), SessionError> {
        self.send(SessionCommand::RemoteAnswer { from, answer })
    }

    pub fn remote_candidate(&self, from: PeerId, candidate: IceCandidate) -> Result<(), SessionError> {
        self.send(SessionCommand::RemoteCandidate { from, candidate })
    }

    pub fn start_media(&self, media: LocalMedia) -> Result<(), SessionError> {
        self.send(SessionCommand::StartMedia(media))
    }

    /// Current sessions, ordered by remote identity.
    pub async fn sessions(&self) -> Result<Vec<SessionSummary>, SessionError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(SessionCommand::Inspect(reply_tx))?;
        reply_rx.await.map_err(|_| SessionError::ManagerStopped)
    }

    pub fn shutdown(&self) -> Result<(), SessionError> {
        self.send(SessionCommand::Shutdown)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    fn send(&self, cmd: SessionCommand) -> Result<(), SessionError> {
        self.tx.send(cmd).map_err(|_| SessionError::ManagerStopped)
    }
}
