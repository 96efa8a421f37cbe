use crate::capture::LocalTrack;
use crate::error::TransportError;
use crate::negotiation::SessionKey;
use crate::transport::TransportEvent;
use async_trait::async_trait;
use beacon_core::{IceCandidate, SessionDescription};
use tokio::sync::mpsc;

/// One peer-to-peer media session as provided by the media engine.
///
/// Implementations report candidates, connectivity and remote tracks through
/// the event channel they were created with.
#[async_trait]
pub trait PeerTransport: Send + Sync {
    async fn add_track(&self, track: &LocalTrack) -> Result<(), TransportError>;

    /// Swap the outgoing track of the same kind. Returns `false` when no
    /// sender of that kind exists.
    async fn replace_track(&self, track: &LocalTrack) -> Result<bool, TransportError>;

    async fn create_offer(&self) -> Result<SessionDescription, TransportError>;

    async fn create_answer(&self) -> Result<SessionDescription, TransportError>;

    async fn set_local_description(&self, desc: SessionDescription) -> Result<(), TransportError>;

    async fn set_remote_description(&self, desc: SessionDescription)
    -> Result<(), TransportError>;

    /// Must only be called once a remote description is set.
    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<(), TransportError>;

    fn is_closed(&self) -> bool;

    async fn close(&self) -> Result<(), TransportError>;
}

#[async_trait]
pub trait TransportFactory: Send + Sync {
    async fn create(
        &self,
        key: SessionKey,
        events: mpsc::Sender<TransportEvent>,
    ) -> Result<Box<dyn PeerTransport>, TransportError>;
}
