use crate::error::TransportError;
use crate::negotiation::{NegotiationSession, SessionKey, SessionRole};
use crate::transport::{TransportEvent, TransportFactory};
use beacon_core::PeerId;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Owns every negotiation session, keyed by remote participant.
///
/// At most one session per peer exists at any time; a stale session is
/// closed and removed before its replacement is created.
pub struct SessionRegistry {
    sessions: HashMap<PeerId, NegotiationSession>,
    factory: Arc<dyn TransportFactory>,
    events: mpsc::Sender<TransportEvent>,
    next_generation: u64,
}

impl SessionRegistry {
    pub fn new(factory: Arc<dyn TransportFactory>, events: mpsc::Sender<TransportEvent>) -> Self {
        Self {
            sessions: HashMap::new(),
            factory,
            events,
            next_generation: 1,
        }
    }

    /// Return the live session for `peer_id`, or build a fresh one.
    ///
    /// `attempt` is only recorded on newly created sessions.
    pub async fn get_or_create(
        &mut self,
        peer_id: &PeerId,
        role: SessionRole,
        attempt: u32,
    ) -> Result<&mut NegotiationSession, TransportError> {
        let reusable = self
            .sessions
            .get(peer_id)
            .is_some_and(|s| !s.is_stale());

        if !reusable {
            self.remove(peer_id).await;

            let key = SessionKey {
                peer_id: peer_id.clone(),
                generation: self.next_generation,
            };
            self.next_generation += 1;

            let transport = self.factory.create(key.clone(), self.events.clone()).await?;
            info!("Created {:?} session {}", role, key);
            self.sessions.insert(
                peer_id.clone(),
                NegotiationSession::new(key, role, attempt, transport),
            );
        }

        self.sessions.get_mut(peer_id).ok_or(TransportError::Closed)
    }

    pub fn get(&self, peer_id: &PeerId) -> Option<&NegotiationSession> {
        self.sessions.get(peer_id)
    }

    pub fn get_mut(&mut self, peer_id: &PeerId) -> Option<&mut NegotiationSession> {
        self.sessions.get_mut(peer_id)
    }

    /// Session for the exact incarnation named by `key`.
    pub fn get_current_mut(&mut self, key: &SessionKey) -> Option<&mut NegotiationSession> {
        self.sessions
            .get_mut(&key.peer_id)
            .filter(|s| s.key() == key)
    }

    pub fn is_current(&self, key: &SessionKey) -> bool {
        self.sessions
            .get(&key.peer_id)
            .is_some_and(|s| s.key() == key)
    }

    pub fn has_live(&self, peer_id: &PeerId) -> bool {
        self.sessions.get(peer_id).is_some_and(|s| !s.is_stale())
    }

    /// Close and forget the peer's session. Unknown peers are a no-op.
    pub async fn remove(&mut self, peer_id: &PeerId) -> Option<SessionKey> {
        let mut session = self.sessions.remove(peer_id)?;
        debug!("Disposing session {}", session.key());
        session.close().await;
        Some(session.key().clone())
    }

    pub fn peers(&self) -> Vec<PeerId> {
        self.sessions.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &NegotiationSession> {
        self.sessions.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut NegotiationSession> {
        self.sessions.values_mut()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Close every session.
    pub async fn clear(&mut self) {
        for (_, mut session) in self.sessions.drain() {
            session.close().await;
        }
    }
}
