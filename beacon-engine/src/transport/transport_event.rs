use crate::capture::TrackKind;
use crate::negotiation::SessionKey;
use beacon_core::IceCandidate;

/// Connectivity as reported by the underlying transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connectivity {
    New,
    Connecting,
    Connected,
    Disconnected,
    Failed,
    Closed,
}

impl Connectivity {
    /// The remote side is presumed gone once one of these is reported.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Connectivity::Disconnected | Connectivity::Failed | Connectivity::Closed
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTrackInfo {
    pub stream_id: String,
    pub track_id: String,
    pub kind: TrackKind,
}

/// Events a transport pushes back into the engine loop.
///
/// Each carries the key of the session that owns the transport so events from
/// a replaced connection can be told apart from the live one.
#[derive(Debug)]
pub enum TransportEvent {
    /// A local candidate was discovered and must be relayed to the peer.
    CandidateGenerated(SessionKey, IceCandidate),

    ConnectivityChanged(SessionKey, Connectivity),

    RemoteTrack(SessionKey, RemoteTrackInfo),
}

impl TransportEvent {
    pub fn key(&self) -> &SessionKey {
        match self {
            TransportEvent::CandidateGenerated(key, _)
            | TransportEvent::ConnectivityChanged(key, _)
            | TransportEvent::RemoteTrack(key, _) => key,
        }
    }
}
