use crate::config::ClientConfig;
use crate::media::LocalMedia;
use crate::session::{PeerSessionManager, SessionManagerHandle, SessionSummary, SessionUpdate};
use crate::signaling::SignalingClient;
use crate::transport::{ConnectionFactory, TransportConfig};
use crate::SessionError;
use anyhow::{Context, Result, bail};
use hush_core::{ClientSignal, IceServerConfig, PeerId, RelaySignal, RoomCode, RosterSnapshot};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// What a participant observes, for whatever front end is attached.
#[derive(Debug, Clone, PartialEq)]
pub enum ParticipantEvent {
    Roster(RosterSnapshot),
    Chat { author_name: String, text: String },
    Session(SessionUpdate),
    /// The relay connection is gone; every session has been closed.
    Disconnected,
}

/// One joined room member: relay connection, session manager and optional local audio.
pub struct Participant {
    peer_id: PeerId,
    room: RoomCode,
    signaling: SignalingClient,
    sessions: SessionManagerHandle,
    media: Option<LocalMedia>,
}

impl Participant {
    /// Connects, waits for the relay to assign an identity and ICE servers,
    /// then joins `config.room`.
    ///
    /// `make_factory` receives the relay's ICE configuration and builds the
    /// connection factory every session will use.
    pub async fn join<F>(
        config: ClientConfig,
        make_factory: F,
    ) -> Result<(Self, mpsc::UnboundedReceiver<ParticipantEvent>)>
    where
        F: FnOnce(TransportConfig) -> Result<Arc<dyn ConnectionFactory>>,
    {
        let url = config.ws_url();
        let (signaling, mut inbound) = SignalingClient::connect(&url)
            .await
            .with_context(|| format!("Failed to connect to relay at {url}"))?;

        let (peer_id, ice_servers) =
            tokio::time::timeout(config.handshake_timeout, handshake(&mut inbound))
                .await
                .context("Timed out waiting for the relay greeting")??;
        info!("Relay assigned identity {}", peer_id);

        let factory = make_factory(TransportConfig::new(ice_servers))
            .context("Failed to set up peer connections")?;
        let (sessions, updates) =
            PeerSessionManager::spawn(peer_id, factory, Arc::new(signaling.clone()));

        signaling.send(ClientSignal::Join {
            room: config.room.clone(),
            display_name: config.display_name.clone(),
        })?;
        info!("Joining room {} as {}", config.room, config.display_name);

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        tokio::spawn(dispatch(inbound, sessions.clone(), events_tx.clone()));
        tokio::spawn(forward_updates(updates, events_tx));

        let participant = Self {
            peer_id,
            room: config.room,
            signaling,
            sessions,
            media: None,
        };
        Ok((participant, events_rx))
    }

    pub fn peer_id(&self) -> PeerId {
        self.peer_id
    }

    pub fn room(&self) -> &RoomCode {
        &self.room
    }

    pub fn send_text(&self, text: impl Into<String>) -> Result<(), SessionError> {
        self.signaling.send(ClientSignal::SendText {
            room: self.room.clone(),
            text: text.into(),
        })
    }

    /// Starts local audio once; later calls return the running capture.
    pub fn start_audio(&mut self) -> Result<LocalMedia, SessionError> {
        if let Some(media) = &self.media {
            return Ok(media.clone());
        }
        let media = LocalMedia::start();
        self.sessions.start_media(media.clone())?;
        self.media = Some(media.clone());
        Ok(media)
    }

    pub async fn sessions(&self) -> Result<Vec<SessionSummary>, SessionError> {
        self.sessions.sessions().await
    }

    /// Closes every session and the relay connection.
    pub fn leave(self) {
        info!("Leaving room {}", self.room);
        let _ = self.sessions.shutdown();
    }
}

async fn handshake(
    inbound: &mut mpsc::UnboundedReceiver<RelaySignal>,
) -> Result<(PeerId, Vec<IceServerConfig>)> {
    let mut peer_id = None;
    let mut ice_servers = None;

    while peer_id.is_none() || ice_servers.is_none() {
        match inbound.recv().await {
            Some(RelaySignal::Welcome { peer_id: id }) => peer_id = Some(id),
            Some(RelaySignal::IceConfig { ice_servers: servers }) => ice_servers = Some(servers),
            Some(other) => debug!("Ignoring {:?} before handshake completed", other),
            None => bail!("Relay closed the connection during the handshake"),
        }
    }

    match (peer_id, ice_servers) {
        (Some(peer_id), Some(ice_servers)) => Ok((peer_id, ice_servers)),
        _ => bail!("Incomplete relay greeting"),
    }
}

/// Routes relay traffic to the session manager and the front end.
async fn dispatch(
    mut inbound: mpsc::UnboundedReceiver<RelaySignal>,
    sessions: SessionManagerHandle,
    events: mpsc::UnboundedSender<ParticipantEvent>,
) {
    while let Some(signal) = inbound.recv().await {
        let routed = match signal {
            RelaySignal::RosterUpdate { snapshot } => {
                let _ = events.send(ParticipantEvent::Roster(snapshot.clone()));
                sessions.roster_update(snapshot)
            }
            RelaySignal::Offer { from, offer } => sessions.remote_offer(from, offer),
            RelaySignal::Answer { from, answer } => sessions.remote_answer(from, answer),
            RelaySignal::IceCandidate { from, candidate } => {
                sessions.remote_candidate(from, candidate)
            }
            RelaySignal::NewMessage {
                author_name, text, ..
            } => {
                let _ = events.send(ParticipantEvent::Chat { author_name, text });
                Ok(())
            }
            RelaySignal::Welcome { .. } | RelaySignal::IceConfig { .. } => {
                debug!("Repeated greeting from relay ignored");
                Ok(())
            }
        };

        if routed.is_err() {
            debug!("Session manager stopped, no longer dispatching");
            break;
        }
    }

    // Losing the relay ends every session.
    let _ = sessions.shutdown();
    let _ = events.send(ParticipantEvent::Disconnected);
}

async fn forward_updates(
    mut updates: mpsc::UnboundedReceiver<SessionUpdate>,
    events: mpsc::UnboundedSender<ParticipantEvent>,
) {
    while let Some(update) = updates.recv().await {
        if events.send(ParticipantEvent::Session(update)).is_err() {
            break;
        }
    }
}
