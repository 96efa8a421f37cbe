use crate::model::description::{IceCandidate, SessionDescription};
use crate::model::peer::PeerId;
use crate::model::room::RoomId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IceServerConfig {
    pub urls: Vec<String>,
    pub username: Option<String>,
    pub credential: Option<String>,
}

impl IceServerConfig {
    pub fn stun(url: impl Into<String>) -> Self {
        Self {
            urls: vec![url.into()],
            username: None,
            credential: None,
        }
    }
}

/// Messages relayed to this client by the signaling server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "op", content = "d", rename_all = "kebab-case")]
pub enum ServerSignal {
    RoomCreated,
    RoomJoined {
        #[serde(rename = "isHostStreaming", default)]
        is_host_streaming: bool,
    },
    RoomFull,
    InvalidRoom,
    RoomExists,
    HostStartedStreaming,
    HostLeft,
    RoomClosed,
    /// A participant entered the room (delivered to the host).
    UserJoined(PeerId),
    /// The host's identity, delivered to a freshly joined viewer.
    ViewerJoined(PeerId),
    UserLeft(PeerId),
    Offer {
        sdp: SessionDescription,
        sender: PeerId,
    },
    Answer {
        sdp: SessionDescription,
        sender: PeerId,
    },
    IceCandidate {
        candidate: IceCandidate,
        sender: PeerId,
    },
    Error {
        error: String,
    },
}

/// Messages this client asks the signaling server to relay or act on.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "op", content = "d", rename_all = "kebab-case")]
pub enum ClientSignal {
    CreateRoom(RoomId),
    JoinRoom(RoomId),
    HostStreaming(RoomId),
    LeaveRoom(RoomId),
    Offer {
        target: PeerId,
        sdp: SessionDescription,
    },
    Answer {
        target: PeerId,
        sdp: SessionDescription,
    },
    IceCandidate {
        target: PeerId,
        candidate: IceCandidate,
    },
}
