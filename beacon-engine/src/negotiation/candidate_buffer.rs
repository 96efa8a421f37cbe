use beacon_core::IceCandidate;
use std::collections::VecDeque;

/// What to do with an inbound remote candidate.
#[derive(Debug, PartialEq, Eq)]
pub enum CandidateDisposition {
    /// Remote description is set; hand it to the transport now.
    Apply(IceCandidate),
    /// Held until the remote description arrives.
    Buffered,
}

/// Remote candidates that arrived before the remote description.
///
/// Non-empty only while unsealed. Sealing drains it in arrival order and every
/// later candidate is returned for immediate application.
#[derive(Debug, Default)]
pub struct CandidateBuffer {
    pending: VecDeque<IceCandidate>,
    sealed: bool,
}

impl CandidateBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn offer(&mut self, candidate: IceCandidate) -> CandidateDisposition {
        if self.sealed {
            return CandidateDisposition::Apply(candidate);
        }
        self.pending.push_back(candidate);
        CandidateDisposition::Buffered
    }

    /// Mark the remote description as applied and return what was waiting.
    pub fn seal(&mut self) -> Vec<IceCandidate> {
        self.sealed = true;
        self.pending.drain(..).collect()
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}
