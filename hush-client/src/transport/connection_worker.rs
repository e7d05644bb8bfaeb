use crate::media::LocalMedia;
use crate::transport::{ConnectionEventKind, ConnectionEvents, ConnectionFactory, PeerConnection};
use hush_core::{IceCandidate, SessionDescription};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

/// Work a session hands to its connection. Executed strictly in submission order.
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionOp {
    CreateOffer,
    AcceptOffer(SessionDescription),
    ApplyAnswer(SessionDescription),
    AddCandidate(IceCandidate),
    AttachMedia(LocalMedia),
}

impl ConnectionOp {
    pub fn kind(&self) -> &'static str {
        match self {
            ConnectionOp::CreateOffer => "create-offer",
            ConnectionOp::AcceptOffer(_) => "accept-offer",
            ConnectionOp::ApplyAnswer(_) => "apply-answer",
            ConnectionOp::AddCandidate(_) => "add-candidate",
            ConnectionOp::AttachMedia(_) => "attach-media",
        }
    }
}

/// Owning handle of a connection worker. Dropping it stops the worker and
/// closes the connection; operations still queued are discarded.
#[derive(Debug)]
pub struct ConnectionHandle {
    ops: mpsc::UnboundedSender<ConnectionOp>,
    _shutdown: oneshot::Sender<()>,
}

impl ConnectionHandle {
    /// A handle whose worker has already gone away. Submissions are dropped.
    #[cfg(test)]
    pub(crate) fn detached() -> Self {
        let (ops, _) = mpsc::unbounded_channel();
        let (shutdown, _) = oneshot::channel();
        Self {
            ops,
            _shutdown: shutdown,
        }
    }

    pub fn submit(&self, op: ConnectionOp) {
        if self.ops.send(op).is_err() {
            debug!("Connection worker already stopped, op dropped");
        }
    }
}

/// Starts a worker that creates the connection, then runs submitted operations one at a time.
pub fn spawn_worker(
    factory: Arc<dyn ConnectionFactory>,
    events: ConnectionEvents,
    media: Option<LocalMedia>,
) -> ConnectionHandle {
    let (ops_tx, ops_rx) = mpsc::unbounded_channel();
    let (shutdown_tx, shutdown_rx) = oneshot::channel();

    tokio::spawn(run_worker(factory, events, media, ops_rx, shutdown_rx));

    ConnectionHandle {
        ops: ops_tx,
        _shutdown: shutdown_tx,
    }
}

async fn run_worker(
    factory: Arc<dyn ConnectionFactory>,
    events: ConnectionEvents,
    media: Option<LocalMedia>,
    mut ops: mpsc::UnboundedReceiver<ConnectionOp>,
    mut shutdown: oneshot::Receiver<()>,
) {
    let remote = events.remote();

    let connection = tokio::select! {
        biased;
        _ = &mut shutdown => return,
        created = factory.connect(events.clone(), media) => match created {
            Ok(connection) => connection,
            Err(e) => {
                warn!("Failed to create connection to {}: {}", remote.short(), e);
                events.emit(ConnectionEventKind::NegotiationFailed(e.to_string())).await;
                return;
            }
        },
    };

    loop {
        let op = tokio::select! {
            biased;
            _ = &mut shutdown => break,
            op = ops.recv() => match op {
                Some(op) => op,
                None => break,
            },
        };

        tokio::select! {
            biased;
            _ = &mut shutdown => break,
            _ = execute(connection.as_ref(), op, &events) => {}
        }
    }

    if let Err(e) = connection.close().await {
        debug!("Closing connection to {} failed: {}", remote.short(), e);
    }
    debug!("Connection worker for {} stopped", remote.short());
}

async fn execute(connection: &dyn PeerConnection, op: ConnectionOp, events: &ConnectionEvents) {
    let kind = op.kind();
    let outcome = match op {
        ConnectionOp::CreateOffer => match connection.create_offer().await {
            Ok(offer) => Ok(ConnectionEventKind::OfferCreated(offer)),
            Err(e) => Err(ConnectionEventKind::NegotiationFailed(e.to_string())),
        },
        ConnectionOp::AcceptOffer(offer) => match connection.accept_offer(offer).await {
            Ok(answer) => Ok(ConnectionEventKind::AnswerCreated(answer)),
            Err(e) => Err(ConnectionEventKind::NegotiationFailed(e.to_string())),
        },
        ConnectionOp::ApplyAnswer(answer) => match connection.apply_answer(answer).await {
            Ok(()) => return,
            Err(e) => Err(ConnectionEventKind::NegotiationFailed(e.to_string())),
        },
        ConnectionOp::AddCandidate(candidate) => match connection.add_candidate(candidate).await {
            Ok(()) => return,
            Err(e) => Err(ConnectionEventKind::CandidateRejected(e.to_string())),
        },
        ConnectionOp::AttachMedia(media) => match connection.attach_media(&media).await {
            Ok(()) => return,
            Err(e) => Err(ConnectionEventKind::MediaRejected(e.to_string())),
        },
    };

    match outcome {
        Ok(event) => events.emit(event).await,
        Err(event) => {
            warn!("{} for {} failed: {:?}", kind, events.remote().short(), event);
            events.emit(event).await;
        }
    }
}
