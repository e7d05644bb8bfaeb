use hush_client::{LocalMedia, OutboundSignal, Role, SessionState};
use hush_core::{PeerId, SessionDescription};

use crate::integration::{Harness, init_tracing};
use crate::utils::{MockConnectionFactory, MockOp, WAIT_MS, eventually, roster};

#[tokio::test]
async fn test_roster_gain_starts_offer() {
    init_tracing();
    let local = PeerId::new();
    let remote = PeerId::new();
    let h = Harness::start_with_media(local, MockConnectionFactory::new());

    h.handle.roster_update(roster(1, &[local, remote])).unwrap();

    assert!(h.wait_for(&remote, Role::Initiator, SessionState::OfferSent).await);
    assert!(
        h.factory
            .has_op(&MockOp::Connect {
                remote,
                with_media: true
            })
            .await
    );
    assert!(h.factory.has_op(&MockOp::CreateOffer(remote)).await);
    assert_eq!(
        h.signaling.get_offer_for(&remote).await,
        Some(SessionDescription::new(format!("offer for {remote}")))
    );

    h.handle
        .remote_answer(remote, SessionDescription::new("answer"))
        .unwrap();

    assert!(h.wait_for(&remote, Role::Initiator, SessionState::Connected).await);
    assert!(h.factory.wait_for_op(&MockOp::ApplyAnswer(remote)).await);
}

#[tokio::test]
async fn test_roster_never_creates_session_for_self() {
    init_tracing();
    let local = PeerId::new();
    let h = Harness::start_with_media(local, MockConnectionFactory::new());

    h.handle.roster_update(roster(1, &[local])).unwrap();

    assert!(h.sessions().await.is_empty());
    assert!(h.factory.ops().await.is_empty());
}

#[tokio::test]
async fn test_media_gates_initiation() {
    init_tracing();
    let local = PeerId::new();
    let remote = PeerId::new();
    let h = Harness::start(local, MockConnectionFactory::new());

    h.handle.roster_update(roster(1, &[local, remote])).unwrap();
    assert!(h.sessions().await.is_empty());

    h.handle.start_media(LocalMedia::start()).unwrap();

    assert!(h.wait_for(&remote, Role::Initiator, SessionState::OfferSent).await);
    assert!(
        h.factory
            .has_op(&MockOp::Connect {
                remote,
                with_media: true
            })
            .await
    );
}

#[tokio::test]
async fn test_local_candidates_follow_the_offer() {
    init_tracing();
    let local = PeerId::new();
    let remote = PeerId::new();
    let h = Harness::start_with_media(local, MockConnectionFactory::new());

    h.handle.roster_update(roster(1, &[local, remote])).unwrap();
    assert!(h.wait_for(&remote, Role::Initiator, SessionState::OfferSent).await);

    assert!(h.factory.gather_candidate(&remote, "candidate:local").await);

    let signaling = &h.signaling;
    let remote_ref = &remote;
    assert!(
        eventually(WAIT_MS, move || async move {
            signaling.get_candidates_for(remote_ref).await == ["candidate:local"]
        })
        .await
    );

    let signals = h.signaling.get_signals().await;
    assert!(matches!(signals[0], OutboundSignal::Offer { .. }));
}
