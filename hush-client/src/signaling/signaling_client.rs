use crate::SessionError;
use crate::signaling::SignalingOutput;
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use hush_core::{ClientSignal, IceCandidate, PeerId, RelaySignal, SessionDescription};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

/// WebSocket connection to the relay.
///
/// Frames are encoded by the caller and queued for a writer task, so sending
/// never blocks. Inbound frames are parsed and delivered on the
/// receiver returned by [`SignalingClient::connect`]; it closes when the socket does.
#[derive(Clone)]
pub struct SignalingClient {
    tx: mpsc::UnboundedSender<String>,
}

impl SignalingClient {
    pub async fn connect(
        url: &str,
    ) -> Result<(Self, mpsc::UnboundedReceiver<RelaySignal>), SessionError> {
        let (stream, _) = connect_async(url).await?;
        info!("Connected to relay at {}", url);

        let (mut sink, mut source) = stream.split();
        let (out_tx, mut out_rx) = mpsc::unbounded_channel::<String>();
        let (in_tx, in_rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            while let Some(json) = out_rx.recv().await {
                if sink.send(Message::text(json)).await.is_err() {
                    break;
                }
            }
            let _ = sink.close().await;
            debug!("Relay writer stopped");
        });

        tokio::spawn(async move {
            while let Some(Ok(frame)) = source.next().await {
                match frame {
                    Message::Text(text) => match serde_json::from_str::<RelaySignal>(text.as_str()) {
                        Ok(signal) => {
                            if in_tx.send(signal).is_err() {
                                break;
                            }
                        }
                        Err(e) => warn!("Invalid RelaySignal: {}", e),
                    },
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            info!("Relay connection closed");
        });

        Ok((Self { tx: out_tx }, in_rx))
    }

    pub fn send(&self, signal: ClientSignal) -> Result<(), SessionError> {
        let json = serde_json::to_string(&signal)?;
        self.tx
            .send(json)
            .map_err(|_| SessionError::SignalingClosed)
    }

    fn send_or_log(&self, signal: ClientSignal) {
        if let Err(e) = self.send(signal) {
            debug!("Dropping outbound signal: {}", e);
        }
    }
}

#[async_trait]
impl SignalingOutput for SignalingClient {
    async fn send_offer(&self, target: PeerId, offer: SessionDescription) {
        self.send_or_log(ClientSignal::Offer { target, offer });
    }

    async fn send_answer(&self, target: PeerId, answer: SessionDescription) {
        self.send_or_log(ClientSignal::Answer { target, answer });
    }

    async fn send_candidate(&self, target: PeerId, candidate: IceCandidate) {
        self.send_or_log(ClientSignal::IceCandidate { target, candidate });
    }
}
