use crate::engine::Membership;
use crate::negotiation::{NegotiationSession, NegotiationState, RemoteMediaHandle, SessionRole};
use beacon_core::PeerId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub peer_id: PeerId,
    pub generation: u64,
    pub role: SessionRole,
    pub state: NegotiationState,
    pub attempt: u32,
    pub buffered_candidates: usize,
    pub has_remote_description: bool,
    pub local_tracks: usize,
    pub remote_media: Option<RemoteMediaHandle>,
}

impl From<&NegotiationSession> for SessionSnapshot {
    fn from(session: &NegotiationSession) -> Self {
        Self {
            peer_id: session.peer_id().clone(),
            generation: session.key().generation,
            role: session.role(),
            state: session.state(),
            attempt: session.attempt(),
            buffered_candidates: session.buffered_candidates(),
            has_remote_description: session.has_remote_description(),
            local_tracks: session.local_tracks().len(),
            remote_media: session.remote_media().cloned(),
        }
    }
}

/// Point-in-time copy of the engine's state.
#[derive(Debug, Clone)]
pub struct EngineSnapshot {
    pub membership: Membership,
    /// Sorted by peer id.
    pub sessions: Vec<SessionSnapshot>,
    /// In arrival order.
    pub pending: Vec<PeerId>,
    pub scheduled_retries: Vec<PeerId>,
    pub capturing: bool,
}

impl EngineSnapshot {
    pub fn session(&self, peer_id: &PeerId) -> Option<&SessionSnapshot> {
        self.sessions.iter().find(|s| &s.peer_id == peer_id)
    }
}
