use crate::error::SignalingError;
use async_trait::async_trait;
use beacon_core::{ClientSignal, IceCandidate, PeerId, SessionDescription};

/// Outbound half of the signaling channel.
///
/// Implementations relay a [`ClientSignal`] to the signaling server, which
/// forwards addressed messages to their target participant. A send that
/// cannot be delivered must return an error so the engine can treat it as a
/// failed negotiation step.
#[async_trait]
pub trait SignalingOutput: Send + Sync {
    async fn send(&self, signal: ClientSignal) -> Result<(), SignalingError>;

    async fn send_offer(
        &self,
        target: PeerId,
        sdp: SessionDescription,
    ) -> Result<(), SignalingError> {
        self.send(ClientSignal::Offer { target, sdp }).await
    }

    async fn send_answer(
        &self,
        target: PeerId,
        sdp: SessionDescription,
    ) -> Result<(), SignalingError> {
        self.send(ClientSignal::Answer { target, sdp }).await
    }

    async fn send_ice(
        &self,
        target: PeerId,
        candidate: IceCandidate,
    ) -> Result<(), SignalingError> {
        self.send(ClientSignal::IceCandidate { target, candidate })
            .await
    }
}
