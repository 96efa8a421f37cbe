use crate::negotiation::RemoteMediaHandle;
use beacon_core::PeerId;
use dashmap::DashMap;
use std::sync::Arc;

/// Read view over the inbound media currently composed per peer.
/// Cheap to clone and safe to hand to another thread.
#[derive(Clone, Default)]
pub struct MediaContext {
    media: Arc<DashMap<PeerId, RemoteMediaHandle>>,
}

impl MediaContext {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&self, peer_id: PeerId, handle: RemoteMediaHandle) {
        self.media.insert(peer_id, handle);
    }

    pub(crate) fn remove(&self, peer_id: &PeerId) {
        self.media.remove(peer_id);
    }

    pub(crate) fn clear(&self) {
        self.media.clear();
    }

    pub fn get(&self, peer_id: &PeerId) -> Option<RemoteMediaHandle> {
        self.media.get(peer_id).map(|entry| entry.value().clone())
    }

    pub fn list_peers(&self) -> Vec<PeerId> {
        self.media.iter().map(|entry| entry.key().clone()).collect()
    }

    pub fn contains(&self, peer_id: &PeerId) -> bool {
        self.media.contains_key(peer_id)
    }

    pub fn len(&self) -> usize {
        self.media.len()
    }

    pub fn is_empty(&self) -> bool {
        self.media.is_empty()
    }
}
