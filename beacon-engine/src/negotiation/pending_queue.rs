use beacon_core::PeerId;
use std::collections::VecDeque;

/// Participants whose join arrived before the local broadcaster was ready.
///
/// Callers check for an existing live session before enqueueing; the queue
/// itself only guarantees no duplicate entries.
#[derive(Debug, Default)]
pub struct PendingQueue {
    entries: VecDeque<PeerId>,
}

impl PendingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` when the peer was already waiting.
    pub fn enqueue(&mut self, peer_id: PeerId) -> bool {
        if self.entries.contains(&peer_id) {
            return false;
        }
        self.entries.push_back(peer_id);
        true
    }

    pub fn remove(&mut self, peer_id: &PeerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|p| p != peer_id);
        before != self.entries.len()
    }

    /// Snapshot in arrival order and clear. Anything enqueued afterwards
    /// waits for the next drain.
    pub fn take_snapshot(&mut self) -> Vec<PeerId> {
        self.entries.drain(..).collect()
    }

    pub fn contains(&self, peer_id: &PeerId) -> bool {
        self.entries.contains(peer_id)
    }

    pub fn peers(&self) -> Vec<PeerId> {
        self.entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
