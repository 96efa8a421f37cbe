use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Server-assigned identity of a participant inside a room.
///
/// The signaling server owns the format; the engine only compares and hashes it.
#[derive(Debug, Serialize, Deserialize, Clone, Hash, Eq, PartialEq, Ord, PartialOrd)]
#[serde(transparent)]
pub struct PeerId(pub String);

impl PeerId {
    /// Random identity, handy for tests and local tooling.
    pub fn random() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl From<&str> for PeerId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for PeerId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
