use crate::negotiation::NegotiationState;
use beacon_core::PeerId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("webrtc: {0}")]
    Webrtc(#[from] webrtc::Error),

    #[error("malformed candidate: {0}")]
    Candidate(#[from] serde_json::Error),

    #[error("description rejected: {0}")]
    Rejected(String),

    #[error("transport already closed")]
    Closed,
}

#[derive(Debug, Error)]
pub enum SignalingError {
    #[error("signaling channel is not connected")]
    Disconnected,

    #[error("failed to encode signal: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("websocket: {0}")]
    Socket(#[from] tokio_tungstenite::tungstenite::Error),
}

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("camera or microphone access denied")]
    Denied,

    #[error("capture device unavailable: {0}")]
    Unavailable(String),
}

/// Why a single negotiation step for one peer did not complete.
#[derive(Debug, Error)]
pub enum NegotiationError {
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("signaling error: {0}")]
    Signaling(#[from] SignalingError),

    #[error("transport produced an empty session description")]
    EmptyDescription,

    #[error("no live local tracks to send")]
    NoLiveTracks,

    #[error("session was replaced or closed while negotiating")]
    Superseded,

    #[error("unexpected transition {from} -> {to}")]
    InvalidTransition {
        from: NegotiationState,
        to: NegotiationState,
    },
}

/// Error surfaced to the user once recovery for a peer is exhausted.
#[derive(Debug, Error)]
#[error("failed to connect to {side} {peer_id}: {source}")]
pub struct PeerError {
    pub peer_id: PeerId,
    pub side: &'static str,
    #[source]
    pub source: NegotiationError,
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("negotiation engine has stopped")]
    Stopped,

    #[error("room id must not be blank")]
    InvalidRoomId,
}
