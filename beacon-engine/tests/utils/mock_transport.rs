use async_trait::async_trait;
use beacon_core::{IceCandidate, SessionDescription};
use beacon_engine::{
    LocalTrack, PeerTransport, SessionKey, TrackKind, TransportError, TransportEvent,
    TransportFactory,
};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// Offer the mock hands out: contains a header extension and a codec outside
/// the interoperable set, so narrowing it changes the text.
pub const MOCK_OFFER: &str = "v=0\r\n\
o=- 1 2 IN IP4 127.0.0.1\r\n\
s=-\r\n\
t=0 0\r\n\
m=audio 9 UDP/TLS/RTP/SAVPF 111 63\r\n\
a=mid:0\r\n\
a=extmap:1 urn:ietf:params:rtp-hdrext:ssrc-audio-level\r\n\
a=rtpmap:111 opus/48000/2\r\n\
a=rtpmap:63 red/48000/2\r\n\
m=video 9 UDP/TLS/RTP/SAVPF 96 45\r\n\
a=mid:1\r\n\
a=rtpmap:96 VP8/90000\r\n\
a=rtpmap:45 AV1/90000\r\n";

pub const MOCK_ANSWER: &str = "v=0\r\n\
o=- 3 4 IN IP4 127.0.0.1\r\n\
s=-\r\n\
t=0 0\r\n\
m=audio 9 UDP/TLS/RTP/SAVPF 111\r\n\
a=mid:0\r\n\
a=rtpmap:111 opus/48000/2\r\n";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportCall {
    AddTrack(TrackKind),
    ReplaceTrack(String),
    CreateOffer,
    CreateAnswer,
    SetLocal(String),
    SetRemote,
    AddCandidate(String),
    Close,
}

/// Knobs and call log shared by every transport a factory creates.
#[derive(Default)]
pub struct TransportControl {
    /// The next N offers come back empty.
    pub empty_offers: AtomicU32,
    /// Reject local descriptions that still carry header extensions.
    pub reject_raw_commits: AtomicBool,
    /// The next N remote descriptions are rejected.
    pub failing_remote_descriptions: AtomicU32,
    /// Candidates handed over before a remote description was set.
    pub premature_candidates: AtomicU32,
    calls: Mutex<Vec<(SessionKey, TransportCall)>>,
}

impl TransportControl {
    fn record(&self, key: &SessionKey, call: TransportCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((key.clone(), call));
        }
    }

    fn take_one(counter: &AtomicU32) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    pub fn calls_for(&self, key: &SessionKey) -> Vec<TransportCall> {
        self.calls
            .lock()
            .map(|calls| {
                calls
                    .iter()
                    .filter(|(k, _)| k == key)
                    .map(|(_, c)| c.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn all_calls(&self) -> Vec<(SessionKey, TransportCall)> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

pub struct MockTransport {
    key: SessionKey,
    control: Arc<TransportControl>,
    kinds: Mutex<Vec<TrackKind>>,
    remote_set: AtomicBool,
    closed: Arc<AtomicBool>,
}

#[async_trait]
impl PeerTransport for MockTransport {
    async fn add_track(&self, track: &LocalTrack) -> Result<(), TransportError> {
        if let Ok(mut kinds) = self.kinds.lock() {
            kinds.push(track.kind());
        }
        self.control
            .record(&self.key, TransportCall::AddTrack(track.kind()));
        Ok(())
    }

    async fn replace_track(&self, track: &LocalTrack) -> Result<bool, TransportError> {
        let has_sender = self
            .kinds
            .lock()
            .map(|k| k.contains(&track.kind()))
            .unwrap_or(false);
        if has_sender {
            self.control
                .record(&self.key, TransportCall::ReplaceTrack(track.id().to_owned()));
        }
        Ok(has_sender)
    }

    async fn create_offer(&self) -> Result<SessionDescription, TransportError> {
        self.control.record(&self.key, TransportCall::CreateOffer);
        if TransportControl::take_one(&self.control.empty_offers) {
            return Ok(SessionDescription::offer(""));
        }
        Ok(SessionDescription::offer(MOCK_OFFER))
    }

    async fn create_answer(&self) -> Result<SessionDescription, TransportError> {
        self.control.record(&self.key, TransportCall::CreateAnswer);
        Ok(SessionDescription::answer(MOCK_ANSWER))
    }

    async fn set_local_description(&self, desc: SessionDescription) -> Result<(), TransportError> {
        self.control
            .record(&self.key, TransportCall::SetLocal(desc.sdp.clone()));
        if desc.sdp.trim().is_empty() {
            return Err(TransportError::Rejected("empty description".into()));
        }
        if self.control.reject_raw_commits.load(Ordering::SeqCst) && desc.sdp.contains("a=extmap")
        {
            return Err(TransportError::Rejected("unsupported extension".into()));
        }
        Ok(())
    }

    async fn set_remote_description(
        &self,
        _desc: SessionDescription,
    ) -> Result<(), TransportError> {
        self.control.record(&self.key, TransportCall::SetRemote);
        if TransportControl::take_one(&self.control.failing_remote_descriptions) {
            return Err(TransportError::Rejected("bad remote description".into()));
        }
        self.remote_set.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<(), TransportError> {
        if !self.remote_set.load(Ordering::SeqCst) {
            self.control
                .premature_candidates
                .fetch_add(1, Ordering::SeqCst);
            return Err(TransportError::Rejected("no remote description".into()));
        }
        self.control
            .record(&self.key, TransportCall::AddCandidate(candidate.candidate));
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    async fn close(&self) -> Result<(), TransportError> {
        if !self.closed.swap(true, Ordering::SeqCst) {
            self.control.record(&self.key, TransportCall::Close);
        }
        Ok(())
    }
}

/// Factory producing [`MockTransport`]s that share one [`TransportControl`].
#[derive(Clone, Default)]
pub struct MockTransportFactory {
    pub control: Arc<TransportControl>,
    created: Arc<Mutex<Vec<SessionKey>>>,
    events: Arc<Mutex<Option<mpsc::Sender<TransportEvent>>>>,
}

impl MockTransportFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn created(&self) -> Vec<SessionKey> {
        self.created.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn created_for(&self, peer: &str) -> Vec<SessionKey> {
        self.created()
            .into_iter()
            .filter(|k| k.peer_id.as_str() == peer)
            .collect()
    }

    /// Push a transport event into the engine as if a transport raised it.
    pub async fn emit(&self, event: TransportEvent) -> anyhow::Result<()> {
        let tx = self
            .events
            .lock()
            .map_err(|_| anyhow::anyhow!("event sender poisoned"))?
            .clone()
            .ok_or_else(|| anyhow::anyhow!("no transport created yet"))?;
        tx.send(event)
            .await
            .map_err(|_| anyhow::anyhow!("engine stopped"))
    }
}

#[async_trait]
impl TransportFactory for MockTransportFactory {
    async fn create(
        &self,
        key: SessionKey,
        events: mpsc::Sender<TransportEvent>,
    ) -> Result<Box<dyn PeerTransport>, TransportError> {
        tracing::debug!("[MockTransport] create {}", key);

        if let Ok(mut created) = self.created.lock() {
            created.push(key.clone());
        }
        if let Ok(mut slot) = self.events.lock() {
            *slot = Some(events);
        }

        Ok(Box::new(MockTransport {
            key,
            control: Arc::clone(&self.control),
            kinds: Mutex::new(Vec::new()),
            remote_set: AtomicBool::new(false),
            closed: Arc::new(AtomicBool::new(false)),
        }))
    }
}
