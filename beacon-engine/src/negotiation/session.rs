use crate::capture::{LocalTrack, TrackKind};
use crate::error::NegotiationError;
use crate::negotiation::{
    CandidateBuffer, CandidateDisposition, NegotiationState, RemoteMediaHandle, SessionRole,
    commit_local_description,
};
use crate::transport::{PeerTransport, RemoteTrackInfo};
use beacon_core::{IceCandidate, PeerId, SessionDescription};
use std::fmt;
use tracing::{debug, info, warn};

/// Identifies one incarnation of a peer's session.
///
/// A replacement session for the same peer gets a higher generation, so
/// late events addressed to the old one can be recognised and dropped.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub peer_id: PeerId,
    pub generation: u64,
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.peer_id, self.generation)
    }
}

/// Result of handing a remote candidate to a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateOutcome {
    Applied,
    Buffered,
}

/// Negotiation state for a single remote participant.
pub struct NegotiationSession {
    key: SessionKey,
    role: SessionRole,
    state: NegotiationState,
    attempt: u32,
    transport: Box<dyn PeerTransport>,
    local_tracks: Vec<(String, TrackKind)>,
    remote_media: Option<RemoteMediaHandle>,
    candidates: CandidateBuffer,
}

impl NegotiationSession {
    pub fn new(
        key: SessionKey,
        role: SessionRole,
        attempt: u32,
        transport: Box<dyn PeerTransport>,
    ) -> Self {
        Self {
            key,
            role,
            state: NegotiationState::Idle,
            attempt,
            transport,
            local_tracks: Vec::new(),
            remote_media: None,
            candidates: CandidateBuffer::new(),
        }
    }

    pub fn key(&self) -> &SessionKey {
        &self.key
    }

    pub fn peer_id(&self) -> &PeerId {
        &self.key.peer_id
    }

    pub fn role(&self) -> SessionRole {
        self.role
    }

    pub fn state(&self) -> NegotiationState {
        self.state
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn local_tracks(&self) -> &[(String, TrackKind)] {
        &self.local_tracks
    }

    pub fn remote_media(&self) -> Option<&RemoteMediaHandle> {
        self.remote_media.as_ref()
    }

    pub fn buffered_candidates(&self) -> usize {
        self.candidates.len()
    }

    pub fn has_remote_description(&self) -> bool {
        self.candidates.is_sealed()
    }

    /// Terminal, or its transport was closed underneath it.
    pub fn is_stale(&self) -> bool {
        self.state.is_terminal() || self.transport.is_closed()
    }

    fn advance(&mut self, next: NegotiationState) -> Result<(), NegotiationError> {
        if !self.state.can_transition_to(next) {
            return Err(NegotiationError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        debug!("Session {}: {} -> {}", self.key, self.state, next);
        self.state = next;
        Ok(())
    }

    /// Validate and attach local tracks ahead of an offer.
    pub async fn attach_tracks(&mut self, tracks: &[LocalTrack]) -> Result<(), NegotiationError> {
        self.advance(NegotiationState::CapabilityCheck)?;

        let live: Vec<&LocalTrack> = tracks.iter().filter(|t| t.is_live()).collect();
        if live.is_empty() {
            self.advance(NegotiationState::Idle)?;
            return Err(NegotiationError::NoLiveTracks);
        }

        for track in live {
            if let Err(e) = self.transport.add_track(track).await {
                self.advance(NegotiationState::Idle)?;
                return Err(e.into());
            }
            debug!("Attached {:?} track {} to {}", track.kind(), track.id(), self.key);
            self.local_tracks.push((track.id().to_owned(), track.kind()));
        }
        Ok(())
    }

    /// Create and commit the local offer. The returned description is what
    /// must be transmitted; on failure the session is back in `Idle`.
    pub async fn create_offer(&mut self) -> Result<SessionDescription, NegotiationError> {
        self.advance(NegotiationState::Offering)?;

        let result = match self.transport.create_offer().await {
            Ok(offer) => commit_local_description(self.transport.as_ref(), offer).await,
            Err(e) => Err(e.into()),
        };

        match result {
            Ok(committed) => {
                self.advance(NegotiationState::OfferSent)?;
                Ok(committed)
            }
            Err(e) => {
                self.advance(NegotiationState::Idle)?;
                Err(e)
            }
        }
    }

    /// Apply the peer's answer and release buffered candidates.
    pub async fn accept_answer(
        &mut self,
        answer: SessionDescription,
    ) -> Result<usize, NegotiationError> {
        if self.state != NegotiationState::OfferSent {
            return Err(NegotiationError::InvalidTransition {
                from: self.state,
                to: NegotiationState::Established,
            });
        }

        self.transport.set_remote_description(answer).await?;
        let applied = self.drain_candidates().await;
        self.advance(NegotiationState::Established)?;
        Ok(applied)
    }

    /// Apply a remote offer, release buffered candidates and produce the
    /// committed answer. The session stays in `Answering` until
    /// [`mark_answer_sent`](Self::mark_answer_sent).
    pub async fn accept_offer(
        &mut self,
        offer: SessionDescription,
    ) -> Result<SessionDescription, NegotiationError> {
        self.advance(NegotiationState::Answering)?;

        self.transport.set_remote_description(offer).await?;
        let applied = self.drain_candidates().await;
        if applied > 0 {
            info!("Applied {} early candidates for {}", applied, self.key);
        }

        let answer = self.transport.create_answer().await?;
        commit_local_description(self.transport.as_ref(), answer).await
    }

    pub fn mark_answer_sent(&mut self) -> Result<(), NegotiationError> {
        self.advance(NegotiationState::Established)
    }

    async fn drain_candidates(&mut self) -> usize {
        let pending = self.candidates.seal();
        let total = pending.len();
        for candidate in pending {
            if let Err(e) = self.transport.add_ice_candidate(candidate).await {
                warn!("Failed to apply buffered candidate for {}: {}", self.key, e);
            }
        }
        total
    }

    /// Apply a remote candidate now, or hold it until a remote description
    /// exists.
    pub async fn add_remote_candidate(
        &mut self,
        candidate: IceCandidate,
    ) -> Result<CandidateOutcome, NegotiationError> {
        match self.candidates.offer(candidate) {
            CandidateDisposition::Buffered => Ok(CandidateOutcome::Buffered),
            CandidateDisposition::Apply(candidate) => {
                self.transport.add_ice_candidate(candidate).await?;
                Ok(CandidateOutcome::Applied)
            }
        }
    }

    pub async fn replace_track(&mut self, track: &LocalTrack) -> Result<bool, NegotiationError> {
        let replaced = self.transport.replace_track(track).await?;
        if replaced {
            self.local_tracks.retain(|(_, kind)| *kind != track.kind());
            self.local_tracks.push((track.id().to_owned(), track.kind()));
        }
        Ok(replaced)
    }

    pub fn add_remote_track(&mut self, info: RemoteTrackInfo) -> RemoteMediaHandle {
        let handle = match self.remote_media.take() {
            Some(mut handle) => {
                handle.merge(info);
                handle
            }
            None => RemoteMediaHandle::from_track(info),
        };
        self.remote_media = Some(handle.clone());
        handle
    }

    pub fn mark_failed(&mut self) {
        if !self.state.is_terminal() {
            self.state = NegotiationState::Failed;
        }
    }

    /// Close the transport and drop buffered state. Safe to call repeatedly.
    pub async fn close(&mut self) {
        self.candidates.clear();
        if self.state != NegotiationState::Closed {
            self.state = NegotiationState::Closed;
        }
        if let Err(e) = self.transport.close().await {
            debug!("Closing transport for {}: {}", self.key, e);
        }
    }
}

impl fmt::Debug for NegotiationSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NegotiationSession")
            .field("key", &self.key)
            .field("role", &self.role)
            .field("state", &self.state)
            .field("attempt", &self.attempt)
            .field("buffered", &self.candidates.len())
            .finish()
    }
}
