use anyhow::Result;
use beacon_core::{IceCandidate, PeerId, ServerSignal, SessionDescription};
use beacon_engine::NegotiationState;
use std::sync::atomic::Ordering;

use crate::integration::{create_test_engine, init_tracing};
use crate::utils::{MOCK_ANSWER, TransportCall};

#[tokio::test]
async fn test_candidates_wait_for_answer_and_keep_order() -> Result<()> {
    init_tracing();
    let engine = create_test_engine();
    engine.go_live("room-1").await?;

    let viewer = PeerId::from("viewer-b");
    engine.join("viewer-b").await?;

    for name in ["candidate:1", "candidate:2", "candidate:3"] {
        engine
            .handle
            .dispatch(ServerSignal::IceCandidate {
                candidate: IceCandidate::new(name),
                sender: viewer.clone(),
            })
            .await?;
    }

    let before = engine.handle.snapshot().await?;
    let session = before.session(&viewer).expect("session exists");
    assert_eq!(session.buffered_candidates, 3);
    assert!(!session.has_remote_description);

    engine
        .handle
        .dispatch(ServerSignal::Answer {
            sdp: SessionDescription::answer(MOCK_ANSWER),
            sender: viewer.clone(),
        })
        .await?;
    engine
        .handle
        .dispatch(ServerSignal::IceCandidate {
            candidate: IceCandidate::new("candidate:4"),
            sender: viewer.clone(),
        })
        .await?;

    let after = engine.handle.snapshot().await?;
    let session = after.session(&viewer).expect("session exists");
    assert_eq!(session.state, NegotiationState::Established);
    assert_eq!(session.buffered_candidates, 0);
    assert!(session.has_remote_description);

    let key = &engine.factory.created_for("viewer-b")[0];
    let tail: Vec<TransportCall> = engine
        .factory
        .control
        .calls_for(key)
        .into_iter()
        .skip_while(|c| *c != TransportCall::SetRemote)
        .collect();
    assert_eq!(
        tail,
        vec![
            TransportCall::SetRemote,
            TransportCall::AddCandidate("candidate:1".into()),
            TransportCall::AddCandidate("candidate:2".into()),
            TransportCall::AddCandidate("candidate:3".into()),
            TransportCall::AddCandidate("candidate:4".into()),
        ]
    );
    assert_eq!(
        engine
            .factory
            .control
            .premature_candidates
            .load(Ordering::SeqCst),
        0
    );
    Ok(())
}

#[tokio::test]
async fn test_host_drops_candidates_from_unknown_peer() -> Result<()> {
    init_tracing();
    let engine = create_test_engine();
    engine.go_live("room-1").await?;

    engine
        .handle
        .dispatch(ServerSignal::IceCandidate {
            candidate: IceCandidate::new("candidate:1"),
            sender: PeerId::from("stranger"),
        })
        .await?;

    let snapshot = engine.handle.snapshot().await?;
    assert!(snapshot.sessions.is_empty());
    assert!(engine.factory.created().is_empty());
    Ok(())
}
