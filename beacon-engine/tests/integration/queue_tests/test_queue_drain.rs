use anyhow::Result;
use beacon_core::PeerId;
use beacon_engine::{HostStage, Membership, NegotiationState};

use crate::integration::{create_test_engine, init_tracing};

#[tokio::test]
async fn test_every_queued_viewer_gets_exactly_one_offer() -> Result<()> {
    init_tracing();
    let engine = create_test_engine();
    engine.become_host("room-1").await?;

    for peer in ["viewer-a", "viewer-b", "viewer-c"] {
        engine.join(peer).await?;
    }
    engine.join("viewer-b").await?;

    let standby = engine.handle.snapshot().await?;
    assert!(matches!(
        standby.membership,
        Membership::Host {
            stage: HostStage::Standby,
            ..
        }
    ));
    assert!(standby.sessions.is_empty());
    assert_eq!(
        standby.pending,
        vec![
            PeerId::from("viewer-a"),
            PeerId::from("viewer-b"),
            PeerId::from("viewer-c")
        ]
    );

    engine.handle.start_stream().await?;
    engine.join("viewer-d").await?;

    let live = engine.handle.snapshot().await?;
    assert!(live.pending.is_empty());
    assert_eq!(live.sessions.len(), 4);
    for peer in ["viewer-a", "viewer-b", "viewer-c", "viewer-d"] {
        let id = PeerId::from(peer);
        assert_eq!(engine.signaling.offers_for(&id).await.len(), 1, "{peer}");
        assert_eq!(
            live.session(&id).map(|s| s.state),
            Some(NegotiationState::OfferSent)
        );
    }
    Ok(())
}

#[tokio::test]
async fn test_departed_viewer_leaves_queue() -> Result<()> {
    init_tracing();
    let engine = create_test_engine();
    engine.become_host("room-1").await?;

    engine.join("viewer-a").await?;
    engine.join("viewer-b").await?;
    engine
        .handle
        .dispatch(beacon_core::ServerSignal::UserLeft(PeerId::from("viewer-a")))
        .await?;
    engine.handle.start_stream().await?;

    let snapshot = engine.handle.snapshot().await?;
    assert_eq!(snapshot.sessions.len(), 1);
    assert!(snapshot.session(&PeerId::from("viewer-b")).is_some());
    assert!(
        engine
            .signaling
            .offers_for(&PeerId::from("viewer-a"))
            .await
            .is_empty()
    );
    Ok(())
}
