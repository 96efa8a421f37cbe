use anyhow::Result;
use beacon_core::{IceCandidate, PeerId, ServerSignal, SessionDescription};
use beacon_engine::{NegotiationState, SessionRole};
use std::sync::atomic::Ordering;

use crate::integration::{create_test_engine, init_tracing};
use crate::utils::{MOCK_OFFER, TransportCall};

#[tokio::test]
async fn test_candidates_before_offer_are_applied_after_it() -> Result<()> {
    init_tracing();
    let engine = create_test_engine();
    engine.become_viewer("room-1", "host-1").await?;

    let host = PeerId::from("host-1");
    for name in ["candidate:h1", "candidate:h2"] {
        engine
            .handle
            .dispatch(ServerSignal::IceCandidate {
                candidate: IceCandidate::new(name),
                sender: host.clone(),
            })
            .await?;
    }

    let before = engine.handle.snapshot().await?;
    let session = before.session(&host).expect("pre-created session");
    assert_eq!(session.role, SessionRole::ViewerSide);
    assert_eq!(session.state, NegotiationState::Idle);
    assert_eq!(session.buffered_candidates, 2);

    engine
        .handle
        .dispatch(ServerSignal::Offer {
            sdp: SessionDescription::offer(MOCK_OFFER),
            sender: host.clone(),
        })
        .await?;

    let after = engine.handle.snapshot().await?;
    let session = after.session(&host).expect("session exists");
    assert_eq!(session.state, NegotiationState::Established);
    assert_eq!(session.buffered_candidates, 0);
    // The idle session was reused rather than replaced.
    assert_eq!(session.generation, before.session(&host).map_or(0, |s| s.generation));

    let key = &engine.factory.created_for("host-1")[0];
    let calls = engine.factory.control.calls_for(key);
    assert_eq!(
        &calls[..3],
        &[
            TransportCall::SetRemote,
            TransportCall::AddCandidate("candidate:h1".into()),
            TransportCall::AddCandidate("candidate:h2".into()),
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
async fn test_candidate_without_prior_session_creates_one() -> Result<()> {
    init_tracing();
    let engine = create_test_engine();
    engine.handle.join_room("room-1").await?;
    engine
        .handle
        .dispatch(ServerSignal::RoomJoined {
            is_host_streaming: false,
        })
        .await?;

    let host = PeerId::from("host-2");
    engine
        .handle
        .dispatch(ServerSignal::IceCandidate {
            candidate: IceCandidate::new("candidate:early"),
            sender: host.clone(),
        })
        .await?;

    let snapshot = engine.handle.snapshot().await?;
    let session = snapshot.session(&host).expect("session created");
    assert_eq!(session.state, NegotiationState::Idle);
    assert_eq!(session.buffered_candidates, 1);
    Ok(())
}
