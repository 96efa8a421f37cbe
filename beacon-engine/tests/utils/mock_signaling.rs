use async_trait::async_trait;
use beacon_core::{ClientSignal, IceCandidate, PeerId, SessionDescription};
use beacon_engine::{SignalingError, SignalingOutput};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{Mutex, mpsc};

/// Mock SignalingOutput that captures all outgoing signals.
#[derive(Clone)]
pub struct MockSignalingOutput {
    /// Channel to send captured signals.
    tx: mpsc::UnboundedSender<ClientSignal>,
    /// All captured signals (for verification).
    signals: Arc<Mutex<Vec<ClientSignal>>>,
    /// While set, every send fails as if the socket were down.
    offline: Arc<AtomicBool>,
}

impl MockSignalingOutput {
    /// Create a new MockSignalingOutput and its receiver channel.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ClientSignal>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let signaling = Self {
            tx,
            signals: Arc::new(Mutex::new(Vec::new())),
            offline: Arc::new(AtomicBool::new(false)),
        };
        (signaling, rx)
    }

    /// Create a MockSignalingOutput without a receiver (signals are only stored).
    pub fn new_stored_only() -> Self {
        let (signaling, _rx) = Self::new();
        signaling
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub async fn all(&self) -> Vec<ClientSignal> {
        self.signals.lock().await.clone()
    }

    /// Every offer sent to a specific peer, oldest first.
    pub async fn offers_for(&self, peer_id: &PeerId) -> Vec<SessionDescription> {
        self.signals
            .lock()
            .await
            .iter()
            .filter_map(|s| match s {
                ClientSignal::Offer { target, sdp } if target == peer_id => Some(sdp.clone()),
                _ => None,
            })
            .collect()
    }

    pub async fn answers_for(&self, peer_id: &PeerId) -> Vec<SessionDescription> {
        self.signals
            .lock()
            .await
            .iter()
            .filter_map(|s| match s {
                ClientSignal::Answer { target, sdp } if target == peer_id => Some(sdp.clone()),
                _ => None,
            })
            .collect()
    }

    pub async fn candidates_for(&self, peer_id: &PeerId) -> Vec<IceCandidate> {
        self.signals
            .lock()
            .await
            .iter()
            .filter_map(|s| match s {
                ClientSignal::IceCandidate { target, candidate } if target == peer_id => {
                    Some(candidate.clone())
                }
                _ => None,
            })
            .collect()
    }

    /// Room requests (create, join, host-streaming, leave) in order.
    pub async fn room_signals(&self) -> Vec<ClientSignal> {
        self.signals
            .lock()
            .await
            .iter()
            .filter(|s| {
                matches!(
                    s,
                    ClientSignal::CreateRoom(_)
                        | ClientSignal::JoinRoom(_)
                        | ClientSignal::HostStreaming(_)
                        | ClientSignal::LeaveRoom(_)
                )
            })
            .cloned()
            .collect()
    }
}

impl Default for MockSignalingOutput {
    fn default() -> Self {
        Self::new_stored_only()
    }
}

#[async_trait]
impl SignalingOutput for MockSignalingOutput {
    async fn send(&self, signal: ClientSignal) -> Result<(), SignalingError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(SignalingError::Disconnected);
        }

        tracing::debug!("[MockSignaling] send {:?}", signal);

        self.signals.lock().await.push(signal.clone());
        let _ = self.tx.send(signal);
        Ok(())
    }
}
