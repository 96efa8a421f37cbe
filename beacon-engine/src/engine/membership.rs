use beacon_core::{PeerId, RoomId};

/// Role the local client ended up with inside a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalRole {
    Host,
    Viewer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostStage {
    /// Room exists but no usable capture yet (pending or denied).
    AwaitingCapture,
    /// Capture acquired, broadcast not started.
    Standby,
    Live,
}

/// Where the local client is in the room lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Membership {
    Lobby,
    Creating(RoomId),
    Joining(RoomId),
    Host {
        room: RoomId,
        stage: HostStage,
    },
    Viewer {
        room: RoomId,
        host: Option<PeerId>,
        host_streaming: bool,
    },
}

impl Membership {
    pub fn room(&self) -> Option<&RoomId> {
        match self {
            Membership::Lobby => None,
            Membership::Creating(room) | Membership::Joining(room) => Some(room),
            Membership::Host { room, .. } | Membership::Viewer { room, .. } => Some(room),
        }
    }

    pub fn role(&self) -> Option<LocalRole> {
        match self {
            Membership::Host { .. } => Some(LocalRole::Host),
            Membership::Viewer { .. } => Some(LocalRole::Viewer),
            _ => None,
        }
    }

    pub fn is_host(&self) -> bool {
        matches!(self, Membership::Host { .. })
    }

    pub fn is_viewer(&self) -> bool {
        matches!(self, Membership::Viewer { .. })
    }

    pub fn is_live_host(&self) -> bool {
        matches!(
            self,
            Membership::Host {
                stage: HostStage::Live,
                ..
            }
        )
    }
}
