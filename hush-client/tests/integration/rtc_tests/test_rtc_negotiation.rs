use bytes::Bytes;
use hush_client::{
    ConnectionEventKind, ConnectionEvents, ConnectionFactory, LocalMedia, PeerConnection,
    RtcConnectionFactory, SessionId, TransportConfig,
};
use hush_core::PeerId;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::integration::init_tracing;

/// One 20 ms Opus frame of silence.
const SILENT_OPUS_FRAME: &[u8] = &[0xf8, 0xff, 0xfe];
const FRAME: Duration = Duration::from_millis(20);

/// No STUN servers: host candidates only, nothing leaves the machine.
fn offline_factory() -> RtcConnectionFactory {
    RtcConnectionFactory::new(TransportConfig::new(Vec::new()))
}

#[tokio::test]
async fn test_offer_carries_local_audio() {
    init_tracing();
    let factory = offline_factory();
    let (tx, _rx) = mpsc::channel(64);
    let events = ConnectionEvents::new(PeerId::new(), SessionId(1), tx);

    let connection = factory
        .connect(events, Some(LocalMedia::start()))
        .await
        .expect("peer connection");
    let offer = connection.create_offer().await.expect("offer");

    assert!(offer.sdp.starts_with("v=0"));
    assert!(offer.sdp.contains("m=audio"));
    assert!(offer.sdp.to_lowercase().contains("opus"));

    connection.close().await.expect("close");
}

#[tokio::test]
async fn test_offer_answer_between_two_connections() {
    init_tracing();
    let factory = offline_factory();
    let (a_tx, _a_rx) = mpsc::channel(64);
    let (b_tx, _b_rx) = mpsc::channel(64);

    let a = factory
        .connect(
            ConnectionEvents::new(PeerId::new(), SessionId(1), a_tx),
            Some(LocalMedia::start()),
        )
        .await
        .expect("initiator connection");
    let b = factory
        .connect(ConnectionEvents::new(PeerId::new(), SessionId(1), b_tx), None)
        .await
        .expect("responder connection");

    let offer = a.create_offer().await.expect("offer");
    let answer = b.accept_offer(offer).await.expect("answer");
    assert!(answer.sdp.contains("m=audio"));

    a.apply_answer(answer).await.expect("apply answer");

    a.close().await.expect("close initiator");
    b.close().await.expect("close responder");
}

#[tokio::test]
async fn test_garbage_offer_is_rejected() {
    init_tracing();
    let factory = offline_factory();
    let (tx, _rx) = mpsc::channel(64);

    let connection = factory
        .connect(ConnectionEvents::new(PeerId::new(), SessionId(1), tx), None)
        .await
        .expect("peer connection");

    let result = connection
        .accept_offer(hush_core::SessionDescription::new("not sdp"))
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_written_samples_reach_remote_peer() {
    init_tracing();
    let factory = offline_factory();
    let media = LocalMedia::start();
    let (a_tx, mut a_rx) = mpsc::channel(64);
    let (b_tx, mut b_rx) = mpsc::channel(64);

    let a: Arc<dyn PeerConnection> = Arc::from(
        factory
            .connect(
                ConnectionEvents::new(PeerId::new(), SessionId(1), a_tx),
                Some(media.clone()),
            )
            .await
            .expect("sending connection"),
    );
    let b: Arc<dyn PeerConnection> = Arc::from(
        factory
            .connect(ConnectionEvents::new(PeerId::new(), SessionId(1), b_tx), None)
            .await
            .expect("receiving connection"),
    );

    let offer = a.create_offer().await.expect("offer");
    let answer = b.accept_offer(offer).await.expect("answer");
    a.apply_answer(answer).await.expect("apply answer");

    let deadline = tokio::time::sleep(Duration::from_secs(15));
    tokio::pin!(deadline);
    let mut ticker = tokio::time::interval(FRAME);
    let mut written = 0usize;

    loop {
        tokio::select! {
            _ = &mut deadline => panic!("remote never saw audio after {written} samples"),
            Some(event) = a_rx.recv() => {
                if let ConnectionEventKind::LocalCandidate(candidate) = event.kind {
                    let _ = b.add_candidate(candidate).await;
                }
            }
            Some(event) = b_rx.recv() => match event.kind {
                ConnectionEventKind::LocalCandidate(candidate) => {
                    let _ = a.add_candidate(candidate).await;
                }
                ConnectionEventKind::RemoteTrack => break,
                _ => {}
            },
            _ = ticker.tick() => {
                media
                    .write_sample(Bytes::from_static(SILENT_OPUS_FRAME), FRAME)
                    .await
                    .expect("write sample");
                written += 1;
            }
        }
    }

    assert!(written > 0);
    a.close().await.expect("close sender");
    b.close().await.expect("close receiver");
}
