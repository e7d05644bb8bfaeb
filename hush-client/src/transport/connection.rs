use crate::media::LocalMedia;
use crate::transport::ConnectionEvents;
use crate::SessionError;
use async_trait::async_trait;
use hush_core::{IceCandidate, SessionDescription};

/// One peer-to-peer connection, seen only through the operations negotiation needs.
///
/// Asynchronous results that are not replies to a call (gathered candidates,
/// connectivity changes) go out through the [`ConnectionEvents`] the connection
/// was created with.
#[async_trait]
pub trait PeerConnection: Send + Sync {
    /// Produces a local offer and installs it as the local description.
    async fn create_offer(&self) -> Result<SessionDescription, SessionError>;

    /// Installs a remote offer and returns the local answer.
    async fn accept_offer(&self, offer: SessionDescription)
    -> Result<SessionDescription, SessionError>;

    async fn apply_answer(&self, answer: SessionDescription) -> Result<(), SessionError>;

    async fn add_candidate(&self, candidate: IceCandidate) -> Result<(), SessionError>;

    async fn attach_media(&self, media: &LocalMedia) -> Result<(), SessionError>;

    async fn close(&self) -> Result<(), SessionError>;
}

/// Builds connections. Kept behind a trait so negotiation can run without a network.
#[async_trait]
pub trait ConnectionFactory: Send + Sync {
    async fn connect(
        &self,
        events: ConnectionEvents,
        media: Option<LocalMedia>,
    ) -> Result<Box<dyn PeerConnection>, SessionError>;
}
