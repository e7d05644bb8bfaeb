use hush_core::{ClientSignal, RoomCode};

use crate::integration::{init_tracing, join, start_test_server};

#[tokio::test]
async fn test_invalid_frames_ignored() {
    init_tracing();
    let addr = start_test_server().await;
    let room: RoomCode = "ABC1234".parse().unwrap();

    let mut a = join(addr, &room, "ann").await;

    a.send_raw("not json").await.expect("send garbage");
    a.send_raw(r#"{"op":"Join","d":{"room":"bad","display_name":"x"}}"#)
        .await
        .expect("send bad join");

    // The socket survives and still works.
    a.send(ClientSignal::Join {
        room,
        display_name: "ann".into(),
    })
    .await
    .expect("send join");
    let snapshot = a.next_roster().await.expect("roster after rejoin");
    assert_eq!(snapshot.len(), 1);
}
