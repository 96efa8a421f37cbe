use crate::engine::EngineSnapshot;
use beacon_core::{IceCandidate, PeerId, RoomId, ServerSignal, SessionDescription};
use tokio::sync::oneshot;

/// Why the signaling server refused a create or join request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomRejection {
    Full,
    InvalidRoom,
    AlreadyExists,
}

/// Everything the engine loop reacts to, apart from transport events.
#[derive(Debug)]
pub enum EngineCommand {
    // Relayed by the signaling server
    ParticipantJoined(PeerId),
    ParticipantLeft(PeerId),
    Offer {
        from: PeerId,
        sdp: SessionDescription,
    },
    Answer {
        from: PeerId,
        sdp: SessionDescription,
    },
    IceCandidate {
        from: PeerId,
        candidate: IceCandidate,
    },
    RoomCreated,
    RoomJoined {
        host_streaming: bool,
    },
    RoomRejected(RoomRejection),
    /// The host's identity, sent to a viewer right after it joins.
    HostIdentified(PeerId),
    HostStartedStreaming,
    HostLeft,
    RoomClosed,
    ServerError(String),

    // Signaling link health
    SignalingLost,
    SignalingRestored,

    // Local actions
    CreateRoom(RoomId),
    JoinRoom(RoomId),
    StartStream,
    EndStream,
    LeaveRoom,
    SwitchCamera,
    Snapshot(oneshot::Sender<EngineSnapshot>),
    Shutdown,

    /// Posted back by the engine itself once a retry delay has elapsed.
    RetryOffer {
        peer_id: PeerId,
        attempt: u32,
        ticket: u64,
    },
}

impl From<ServerSignal> for EngineCommand {
    fn from(signal: ServerSignal) -> Self {
        match signal {
            ServerSignal::RoomCreated => EngineCommand::RoomCreated,
            ServerSignal::RoomJoined { is_host_streaming } => EngineCommand::RoomJoined {
                host_streaming: is_host_streaming,
            },
            ServerSignal::RoomFull => EngineCommand::RoomRejected(RoomRejection::Full),
            ServerSignal::InvalidRoom => EngineCommand::RoomRejected(RoomRejection::InvalidRoom),
            ServerSignal::RoomExists => EngineCommand::RoomRejected(RoomRejection::AlreadyExists),
            ServerSignal::HostStartedStreaming => EngineCommand::HostStartedStreaming,
            ServerSignal::HostLeft => EngineCommand::HostLeft,
            ServerSignal::RoomClosed => EngineCommand::RoomClosed,
            ServerSignal::UserJoined(peer_id) => EngineCommand::ParticipantJoined(peer_id),
            ServerSignal::ViewerJoined(host) => EngineCommand::HostIdentified(host),
            ServerSignal::UserLeft(peer_id) => EngineCommand::ParticipantLeft(peer_id),
            ServerSignal::Offer { sdp, sender } => EngineCommand::Offer { from: sender, sdp },
            ServerSignal::Answer { sdp, sender } => EngineCommand::Answer { from: sender, sdp },
            ServerSignal::IceCandidate { candidate, sender } => EngineCommand::IceCandidate {
                from: sender,
                candidate,
            },
            ServerSignal::Error { error } => EngineCommand::ServerError(error),
        }
    }
}
