use crate::SessionError;
use crate::media::LocalMedia;
use crate::transport::{
    ConnectionEventKind, ConnectionEvents, ConnectionFactory, PeerConnection, TransportConfig,
};
use async_trait::async_trait;
use hush_core::{IceCandidate, PeerId, SessionDescription};
use std::sync::Arc;
use tracing::{debug, info};
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::api::APIBuilder;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::rtp_transceiver::RTCRtpTransceiver;
use webrtc::rtp_transceiver::rtp_receiver::RTCRtpReceiver;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_remote::TrackRemote;

/// Builds real WebRTC peer connections from the relay's ICE configuration.
pub struct RtcConnectionFactory {
    config: TransportConfig,
}

impl RtcConnectionFactory {
    pub fn new(config: TransportConfig) -> Self {
        Self { config }
    }

    fn rtc_configuration(&self) -> RTCConfiguration {
        let ice_servers = self
            .config
            .ice_servers
            .iter()
            .map(|server| RTCIceServer {
                urls: server.urls.clone(),
                username: server.username.clone().unwrap_or_default(),
                credential: server.credential.clone().unwrap_or_default(),
            })
            .collect();

        RTCConfiguration {
            ice_servers,
            ..Default::default()
        }
    }

    async fn new_peer_connection(&self) -> Result<Arc<RTCPeerConnection>, SessionError> {
        // Default codecs include Opus, which the local audio track uses.
        let mut media_engine = MediaEngine::default();
        media_engine.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut media_engine)?;

        let api = APIBuilder::new()
            .with_media_engine(media_engine)
            .with_interceptor_registry(registry)
            .build();

        Ok(Arc::new(api.new_peer_connection(self.rtc_configuration()).await?))
    }
}

#[async_trait]
impl ConnectionFactory for RtcConnectionFactory {
    async fn connect(
        &self,
        events: ConnectionEvents,
        media: Option<LocalMedia>,
    ) -> Result<Box<dyn PeerConnection>, SessionError> {
        let connection = RtcConnection::new(events.remote(), self.new_peer_connection().await?);
        connection.install_callbacks(events);

        if let Some(media) = media {
            connection.attach_or_close(&media).await?;
        }
        Ok(Box::new(connection))
    }
}

pub struct RtcConnection {
    remote: PeerId,
    peer_connection: Arc<RTCPeerConnection>,
}

impl RtcConnection {
    fn new(remote: PeerId, peer_connection: Arc<RTCPeerConnection>) -> Self {
        Self {
            remote,
            peer_connection,
        }
    }

    /// A connection that cannot carry our media is never handed out.
    async fn attach_or_close(&self, media: &LocalMedia) -> Result<(), SessionError> {
        let Err(e) = self.attach_media(media).await else {
            return Ok(());
        };
        if let Err(close_err) = self.close().await {
            debug!("Closing unused connection to {} failed: {}", self.remote.short(), close_err);
        }
        Err(e)
    }

    fn install_callbacks(&self, events: ConnectionEvents) {
        let remote = self.remote;

        let state_events = events.clone();
        self.peer_connection
            .on_peer_connection_state_change(Box::new(move |s: RTCPeerConnectionState| {
                let events = state_events.clone();

                Box::pin(async move {
                    info!("Peer connection to {} is {}", remote.short(), s);
                    match s {
                        RTCPeerConnectionState::Connected => {
                            events.emit(ConnectionEventKind::Connected).await;
                        }
                        RTCPeerConnectionState::Failed
                        | RTCPeerConnectionState::Disconnected
                        | RTCPeerConnectionState::Closed => {
                            events.emit(ConnectionEventKind::Lost).await;
                        }
                        _ => {}
                    }
                })
            }));

        let ice_events = events.clone();
        self.peer_connection
            .on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
                let events = ice_events.clone();

                Box::pin(async move {
                    let Some(candidate) = c else { return };
                    let Ok(init) = candidate.to_json() else {
                        return;
                    };
                    let candidate = IceCandidate {
                        candidate: init.candidate,
                        sdp_mid: init.sdp_mid,
                        sdp_m_line_index: init.sdp_mline_index,
                    };
                    events.emit(ConnectionEventKind::LocalCandidate(candidate)).await;
                })
            }));

        // Playback belongs to the embedding application; keep the RTP flowing.
        let track_events = events;
        self.peer_connection.on_track(Box::new(
            move |track: Arc<TrackRemote>, _: Arc<RTCRtpReceiver>, _: Arc<RTCRtpTransceiver>| {
                let events = track_events.clone();

                Box::pin(async move {
                    info!("Remote {} track from {}", track.kind(), remote.short());
                    tokio::spawn(async move { while track.read_rtp().await.is_ok() {} });
                    events.emit(ConnectionEventKind::RemoteTrack).await;
                })
            },
        ));
    }
}

#[async_trait]
impl PeerConnection for RtcConnection {
    async fn create_offer(&self) -> Result<SessionDescription, SessionError> {
        let offer = self.peer_connection.create_offer(None).await?;
        self.peer_connection
            .set_local_description(offer.clone())
            .await?;
        Ok(SessionDescription::new(offer.sdp))
    }

    async fn accept_offer(
        &self,
        offer: SessionDescription,
    ) -> Result<SessionDescription, SessionError> {
        let desc = RTCSessionDescription::offer(offer.sdp)?;
        self.peer_connection.set_remote_description(desc).await?;

        let answer = self.peer_connection.create_answer(None).await?;
        self.peer_connection
            .set_local_description(answer.clone())
            .await?;
        Ok(SessionDescription::new(answer.sdp))
    }

    async fn apply_answer(&self, answer: SessionDescription) -> Result<(), SessionError> {
        let desc = RTCSessionDescription::answer(answer.sdp)?;
        self.peer_connection.set_remote_description(desc).await?;
        Ok(())
    }

    async fn add_candidate(&self, candidate: IceCandidate) -> Result<(), SessionError> {
        let init = RTCIceCandidateInit {
            candidate: candidate.candidate,
            sdp_mid: candidate.sdp_mid,
            sdp_mline_index: candidate.sdp_m_line_index,
            ..Default::default()
        };
        self.peer_connection.add_ice_candidate(init).await?;
        Ok(())
    }

    async fn attach_media(&self, media: &LocalMedia) -> Result<(), SessionError> {
        let sender = self
            .peer_connection
            .add_track(media.track() as Arc<dyn TrackLocal + Send + Sync>)
            .await?;

        // Interceptors only work while RTCP is being read.
        tokio::spawn(async move { while sender.read_rtcp().await.is_ok() {} });
        debug!("Local audio attached for {}", self.remote.short());
        Ok(())
    }

    async fn close(&self) -> Result<(), SessionError> {
        self.peer_connection.close().await?;
        Ok(())
    }
}
