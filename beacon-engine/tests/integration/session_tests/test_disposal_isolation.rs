use anyhow::Result;
use beacon_core::{IceCandidate, PeerId, ServerSignal};
use beacon_engine::NegotiationState;

use crate::integration::{create_test_engine, init_tracing};
use crate::utils::TransportCall;

#[tokio::test]
async fn test_departure_leaves_other_sessions_untouched() -> Result<()> {
    init_tracing();
    let engine = create_test_engine();
    engine.go_live("room-1").await?;

    engine.join("viewer-a").await?;
    engine.join("viewer-b").await?;

    let b = PeerId::from("viewer-b");
    for n in 0..2 {
        engine
            .handle
            .dispatch(ServerSignal::IceCandidate {
                candidate: IceCandidate::new(format!("candidate:b{n}")),
                sender: b.clone(),
            })
            .await?;
    }

    engine
        .handle
        .dispatch(ServerSignal::UserLeft(PeerId::from("viewer-a")))
        .await?;

    let snapshot = engine.handle.snapshot().await?;
    assert!(snapshot.session(&PeerId::from("viewer-a")).is_none());

    let session_b = snapshot.session(&b).expect("viewer-b session survives");
    assert_eq!(session_b.state, NegotiationState::OfferSent);
    assert_eq!(session_b.buffered_candidates, 2);

    let a_key = &engine.factory.created_for("viewer-a")[0];
    let b_key = &engine.factory.created_for("viewer-b")[0];
    assert!(
        engine
            .factory
            .control
            .calls_for(a_key)
            .contains(&TransportCall::Close)
    );
    assert!(
        !engine
            .factory
            .control
            .calls_for(b_key)
            .contains(&TransportCall::Close)
    );
    Ok(())
}

#[tokio::test]
async fn test_leave_for_unknown_peer_is_noop() -> Result<()> {
    init_tracing();
    let engine = create_test_engine();
    engine.go_live("room-1").await?;
    engine.join("viewer-a").await?;

    engine
        .handle
        .dispatch(ServerSignal::UserLeft(PeerId::from("nobody")))
        .await?;

    let snapshot = engine.handle.snapshot().await?;
    assert_eq!(snapshot.sessions.len(), 1);
    Ok(())
}
