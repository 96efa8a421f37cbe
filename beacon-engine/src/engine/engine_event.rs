use crate::capture::CameraFacing;
use crate::engine::{LocalRole, RoomRejection};
use crate::error::{CaptureError, PeerError};
use crate::negotiation::{NegotiationState, RemoteMediaHandle, SessionRole};
use beacon_core::{PeerId, RoomId};

/// Notifications from the engine to whatever drives the UI.
#[derive(Debug)]
pub enum EngineEvent {
    RoleAssigned {
        room: RoomId,
        role: LocalRole,
    },
    RoomRejected(RoomRejection),
    /// Error reported by the server, or a room request that could not be sent.
    RoomError(String),
    CaptureUnavailable(CaptureError),
    StreamStarted,
    StreamEnded,
    CameraSwitched(CameraFacing),
    HostStreaming,
    HostLeft,
    RoomClosed,

    SessionState {
        peer_id: PeerId,
        role: SessionRole,
        state: NegotiationState,
    },
    /// One offer attempt failed; more may follow.
    OfferAttemptFailed {
        peer_id: PeerId,
        attempt: u32,
        reason: String,
    },
    /// Recovery for this peer is exhausted.
    PeerFailed(PeerError),
    PeerLeft(PeerId),
    RemoteMedia {
        peer_id: PeerId,
        media: RemoteMediaHandle,
    },

    SignalingLost,
    SignalingRestored,
}
