use beacon_core::{ClientSignal, PeerId, ServerSignal};
use beacon_engine::EngineHandle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Forward addressed signals from one engine to another, the way the
/// signaling server would for a two-party room.
pub fn spawn_relay(
    mut outbound: mpsc::UnboundedReceiver<ClientSignal>,
    sender: PeerId,
    target: EngineHandle,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(signal) = outbound.recv().await {
            let relayed = match signal {
                ClientSignal::Offer { sdp, .. } => ServerSignal::Offer {
                    sdp,
                    sender: sender.clone(),
                },
                ClientSignal::Answer { sdp, .. } => ServerSignal::Answer {
                    sdp,
                    sender: sender.clone(),
                },
                ClientSignal::IceCandidate { candidate, .. } => ServerSignal::IceCandidate {
                    candidate,
                    sender: sender.clone(),
                },
                _ => continue,
            };
            if target.dispatch(relayed).await.is_err() {
                break;
            }
        }
    })
}
