use async_trait::async_trait;
use hush_client::{
    ConnectionEventKind, ConnectionEvents, ConnectionFactory, LocalMedia, PeerConnection,
    SessionError,
};
use hush_core::{IceCandidate, PeerId, SessionDescription};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{Mutex, Semaphore};

use crate::utils::{WAIT_MS, eventually};

/// Something a mock connection was asked to do.
#[derive(Debug, Clone, PartialEq)]
pub enum MockOp {
    Connect { remote: PeerId, with_media: bool },
    CreateOffer(PeerId),
    AcceptOffer(PeerId),
    ApplyAnswer(PeerId),
    AddCandidate(PeerId, String),
    AttachMedia(PeerId),
    Close(PeerId),
}

#[derive(Default)]
struct MockShared {
    ops: Mutex<Vec<MockOp>>,
    /// Event sender of the most recent connection per remote.
    events: Mutex<HashMap<PeerId, ConnectionEvents>>,
    fail_offers: AtomicBool,
    fail_accepts: AtomicBool,
    fail_answers: AtomicBool,
    answer_gate: Option<Semaphore>,
}

/// ConnectionFactory that records every operation and lets tests play the network.
///
/// # Example
///
/// ```ignore
/// let factory = MockConnectionFactory::new();
/// let (handle, _updates) = PeerSessionManager::spawn(local, factory.as_factory(), signaling);
///
/// // ... manager negotiates with `remote` ...
///
/// factory.mark_connected(&remote).await;
/// ```
#[derive(Clone, Default)]
pub struct MockConnectionFactory {
    shared: Arc<MockShared>,
}

impl MockConnectionFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers are held back until [`release_answer`](Self::release_answer) is called.
    pub fn with_gated_answers() -> Self {
        Self {
            shared: Arc::new(MockShared {
                answer_gate: Some(Semaphore::new(0)),
                ..Default::default()
            }),
        }
    }

    pub fn release_answer(&self) {
        if let Some(gate) = &self.shared.answer_gate {
            gate.add_permits(1);
        }
    }

    /// Makes every following `create_offer` fail.
    pub fn fail_offers(&self, fail: bool) {
        self.shared.fail_offers.store(fail, Ordering::SeqCst);
    }

    /// Makes every following `accept_offer` fail, as for an unusable remote offer.
    pub fn fail_accepts(&self, fail: bool) {
        self.shared.fail_accepts.store(fail, Ordering::SeqCst);
    }

    /// Makes every following `apply_answer` fail.
    pub fn fail_answers(&self, fail: bool) {
        self.shared.fail_answers.store(fail, Ordering::SeqCst);
    }

    pub fn as_factory(&self) -> Arc<dyn ConnectionFactory> {
        Arc::new(self.clone())
    }

    pub async fn ops(&self) -> Vec<MockOp> {
        self.shared.ops.lock().await.clone()
    }

    pub async fn has_op(&self, op: &MockOp) -> bool {
        self.shared.ops.lock().await.contains(op)
    }

    pub async fn wait_for_op(&self, op: &MockOp) -> bool {
        eventually(WAIT_MS, move || async move { self.has_op(op).await }).await
    }

    pub async fn count(&self, matches: impl Fn(&MockOp) -> bool) -> usize {
        self.shared.ops.lock().await.iter().filter(|op| matches(op)).count()
    }

    /// Candidates added for `remote`, in the order the connection received them.
    pub async fn candidates_added(&self, remote: &PeerId) -> Vec<String> {
        self.shared
            .ops
            .lock()
            .await
            .iter()
            .filter_map(|op| match op {
                MockOp::AddCandidate(id, candidate) if id == remote => Some(candidate.clone()),
                _ => None,
            })
            .collect()
    }

    /// Waits until exactly `expected` candidates were added for `remote`, in that order.
    pub async fn wait_for_candidates(&self, remote: &PeerId, expected: &[&str]) -> bool {
        eventually(WAIT_MS, move || async move {
            self.candidates_added(remote).await == expected
        })
        .await
    }

    /// Position of `op` in the recorded sequence.
    pub async fn position(&self, op: &MockOp) -> Option<usize> {
        self.shared.ops.lock().await.iter().position(|o| o == op)
    }

    /// Reports the connection to `remote` as established. False if none was created.
    pub async fn mark_connected(&self, remote: &PeerId) -> bool {
        self.emit(remote, ConnectionEventKind::Connected).await
    }

    pub async fn mark_lost(&self, remote: &PeerId) -> bool {
        self.emit(remote, ConnectionEventKind::Lost).await
    }

    pub async fn gather_candidate(&self, remote: &PeerId, candidate: &str) -> bool {
        self.emit(
            remote,
            ConnectionEventKind::LocalCandidate(IceCandidate::new(candidate)),
        )
        .await
    }

    async fn emit(&self, remote: &PeerId, kind: ConnectionEventKind) -> bool {
        let events = self.shared.events.lock().await.get(remote).cloned();
        match events {
            Some(events) => {
                events.emit(kind).await;
                true
            }
            None => false,
        }
    }

    async fn record(&self, op: MockOp) {
        tracing::debug!("[MockConnection] {:?}", op);
        self.shared.ops.lock().await.push(op);
    }
}

#[async_trait]
impl ConnectionFactory for MockConnectionFactory {
    async fn connect(
        &self,
        events: ConnectionEvents,
        media: Option<LocalMedia>,
    ) -> Result<Box<dyn PeerConnection>, SessionError> {
        let remote = events.remote();
        self.record(MockOp::Connect {
            remote,
            with_media: media.is_some(),
        })
        .await;
        self.shared.events.lock().await.insert(remote, events);

        Ok(Box::new(MockConnection {
            remote,
            factory: self.clone(),
        }))
    }
}

struct MockConnection {
    remote: PeerId,
    factory: MockConnectionFactory,
}

#[async_trait]
impl PeerConnection for MockConnection {
    async fn create_offer(&self) -> Result<SessionDescription, SessionError> {
        self.factory.record(MockOp::CreateOffer(self.remote)).await;
        if self.factory.shared.fail_offers.load(Ordering::SeqCst) {
            return Err(SessionError::Connection("injected offer failure".into()));
        }
        Ok(SessionDescription::new(format!("offer for {}", self.remote)))
    }

    async fn accept_offer(
        &self,
        offer: SessionDescription,
    ) -> Result<SessionDescription, SessionError> {
        self.factory.record(MockOp::AcceptOffer(self.remote)).await;
        if self.factory.shared.fail_accepts.load(Ordering::SeqCst) {
            return Err(SessionError::Connection("injected accept failure".into()));
        }
        if let Some(gate) = &self.factory.shared.answer_gate {
            gate.acquire()
                .await
                .map_err(|e| SessionError::Connection(e.to_string()))?
                .forget();
        }
        Ok(SessionDescription::new(format!("answer to {}", offer.sdp)))
    }

    async fn apply_answer(&self, _answer: SessionDescription) -> Result<(), SessionError> {
        self.factory.record(MockOp::ApplyAnswer(self.remote)).await;
        if self.factory.shared.fail_answers.load(Ordering::SeqCst) {
            return Err(SessionError::Connection("injected answer failure".into()));
        }
        Ok(())
    }

    async fn add_candidate(&self, candidate: IceCandidate) -> Result<(), SessionError> {
        self.factory
            .record(MockOp::AddCandidate(self.remote, candidate.candidate))
            .await;
        Ok(())
    }

    async fn attach_media(&self, _media: &LocalMedia) -> Result<(), SessionError> {
        self.factory.record(MockOp::AttachMedia(self.remote)).await;
        Ok(())
    }

    async fn close(&self) -> Result<(), SessionError> {
        self.factory.record(MockOp::Close(self.remote)).await;
        Ok(())
    }
}
