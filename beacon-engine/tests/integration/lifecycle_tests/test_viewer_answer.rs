use anyhow::Result;
use beacon_core::{PeerId, ServerSignal, SessionDescription};
use beacon_engine::{
    EngineEvent, LocalRole, Membership, NegotiationState, RemoteTrackInfo, SessionRole, TrackKind,
    TransportEvent,
};

use crate::integration::{create_test_engine, init_tracing};
use crate::utils::{MOCK_ANSWER, MOCK_OFFER, wait_for_event};

#[tokio::test]
async fn test_viewer_answers_offer_and_registers_media() -> Result<()> {
    init_tracing();
    let mut engine = create_test_engine();
    engine.become_viewer("room-1", "host-1").await?;

    let host = PeerId::from("host-1");
    engine
        .handle
        .dispatch(ServerSignal::Offer {
            sdp: SessionDescription::offer(MOCK_OFFER),
            sender: host.clone(),
        })
        .await?;

    let snapshot = engine.handle.snapshot().await?;
    assert!(matches!(
        snapshot.membership,
        Membership::Viewer {
            host_streaming: true,
            ..
        }
    ));
    let session = snapshot.session(&host).expect("session exists");
    assert_eq!(session.role, SessionRole::ViewerSide);
    assert_eq!(session.state, NegotiationState::Established);
    assert_eq!(session.local_tracks, 0);

    let answers = engine.signaling.answers_for(&host).await;
    assert_eq!(answers.len(), 1);
    assert_eq!(answers[0].sdp, MOCK_ANSWER);

    let key = engine.factory.created_for("host-1")[0].clone();
    for (id, kind) in [("a1", TrackKind::Audio), ("v1", TrackKind::Video)] {
        engine
            .factory
            .emit(TransportEvent::RemoteTrack(
                key.clone(),
                RemoteTrackInfo {
                    stream_id: "host-stream".into(),
                    track_id: id.into(),
                    kind,
                },
            ))
            .await?;
    }

    let seen = wait_for_event(&mut engine.events, |e| {
        matches!(e, EngineEvent::RemoteMedia { media, .. } if media.tracks.len() == 2)
    })
    .await?;
    assert!(seen.iter().any(|e| matches!(
        e,
        EngineEvent::RoleAssigned {
            role: LocalRole::Viewer,
            ..
        }
    )));

    let media = engine.handle.media().get(&host).expect("media registered");
    assert!(media.has(TrackKind::Audio));
    assert!(media.has(TrackKind::Video));

    engine
        .handle
        .dispatch(ServerSignal::UserLeft(host.clone()))
        .await?;
    engine.handle.snapshot().await?;
    assert!(!engine.handle.media().contains(&host));
    Ok(())
}

#[tokio::test]
async fn test_second_offer_replaces_session() -> Result<()> {
    init_tracing();
    let engine = create_test_engine();
    engine.become_viewer("room-1", "host-1").await?;

    let host = PeerId::from("host-1");
    for _ in 0..2 {
        engine
            .handle
            .dispatch(ServerSignal::Offer {
                sdp: SessionDescription::offer(MOCK_OFFER),
                sender: host.clone(),
            })
            .await?;
    }

    let snapshot = engine.handle.snapshot().await?;
    let keys = engine.factory.created_for("host-1");
    assert_eq!(keys.len(), 2);
    assert_eq!(snapshot.sessions.len(), 1);
    assert_eq!(snapshot.sessions[0].generation, keys[1].generation);
    assert_eq!(engine.signaling.answers_for(&host).await.len(), 2);
    Ok(())
}

#[tokio::test]
async fn test_host_ignores_offers() -> Result<()> {
    init_tracing();
    let engine = create_test_engine();
    engine.go_live("room-1").await?;

    engine
        .handle
        .dispatch(ServerSignal::Offer {
            sdp: SessionDescription::offer(MOCK_OFFER),
            sender: PeerId::from("viewer-a"),
        })
        .await?;

    let snapshot = engine.handle.snapshot().await?;
    assert!(snapshot.sessions.is_empty());
    Ok(())
}
