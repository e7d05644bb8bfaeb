use async_trait::async_trait;
use hush_client::{OutboundSignal, SignalingOutput};
use hush_core::{IceCandidate, PeerId, SessionDescription};
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};

use crate::utils::{WAIT_MS, eventually};

/// Mock SignalingOutput that captures all outgoing signals.
#[derive(Clone)]
pub struct MockSignalingOutput {
    tx: mpsc::UnboundedSender<OutboundSignal>,
    signals: Arc<Mutex<Vec<OutboundSignal>>>,
}

impl MockSignalingOutput {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<OutboundSignal>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let signaling = Self {
            tx,
            signals: Arc::new(Mutex::new(Vec::new())),
        };
        (signaling, rx)
    }

    /// Signals are only stored.
    pub fn new_stored_only() -> Self {
        Self::new().0
    }

    pub fn as_output(&self) -> Arc<dyn SignalingOutput> {
        Arc::new(self.clone())
    }

    pub async fn get_signals(&self) -> Vec<OutboundSignal> {
        self.signals.lock().await.clone()
    }

    pub async fn get_offer_for(&self, target: &PeerId) -> Option<SessionDescription> {
        self.signals.lock().await.iter().find_map(|s| match s {
            OutboundSignal::Offer { target: t, offer } if t == target => Some(offer.clone()),
            _ => None,
        })
    }

    pub async fn get_answer_for(&self, target: &PeerId) -> Option<SessionDescription> {
        self.signals.lock().await.iter().find_map(|s| match s {
            OutboundSignal::Answer { target: t, answer } if t == target => Some(answer.clone()),
            _ => None,
        })
    }

    pub async fn get_candidates_for(&self, target: &PeerId) -> Vec<String> {
        self.signals
            .lock()
            .await
            .iter()
            .filter_map(|s| match s {
                OutboundSignal::Candidate { target: t, candidate } if t == target => {
                    Some(candidate.candidate.clone())
                }
                _ => None,
            })
            .collect()
    }

    /// Waits for an answer addressed to `target`.
    pub async fn wait_for_answer(&self, target: &PeerId) -> Option<SessionDescription> {
        let arrived = eventually(WAIT_MS, move || async move {
            self.get_answer_for(target).await.is_some()
        })
        .await;
        if arrived {
            self.get_answer_for(target).await
        } else {
            None
        }
    }

    async fn capture(&self, signal: OutboundSignal) {
        tracing::debug!("[MockSignaling] {:?}", signal);
        self.signals.lock().await.push(signal.clone());
        let _ = self.tx.send(signal);
    }
}

impl Default for MockSignalingOutput {
    fn default() -> Self {
        Self::new_stored_only()
    }
}

#[async_trait]
impl SignalingOutput for MockSignalingOutput {
    async fn send_offer(&self, target: PeerId, offer: SessionDescription) {
        self.capture(OutboundSignal::Offer { target, offer }).await;
    }

    async fn send_answer(&self, target: PeerId, answer: SessionDescription) {
        self.capture(OutboundSignal::Answer { target, answer }).await;
    }

    async fn send_candidate(&self, target: PeerId, candidate: IceCandidate) {
        self.capture(OutboundSignal::Candidate { target, candidate }).await;
    }
}
