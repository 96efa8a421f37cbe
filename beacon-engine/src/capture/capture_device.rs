use crate::capture::{CaptureConstraints, LocalCapture, LocalTrack, TrackKind};
use crate::error::CaptureError;
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use webrtc::api::media_engine::{MIME_TYPE_OPUS, MIME_TYPE_VP8};
use webrtc::rtp_transceiver::rtp_codec::RTCRtpCodecCapability;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;

/// Camera/microphone access. Permission prompts live behind this trait.
#[async_trait]
pub trait CaptureDevice: Send + Sync {
    /// Acquire audio (if requested) and video with the given constraints.
    async fn open(&self, constraints: &CaptureConstraints) -> Result<LocalCapture, CaptureError>;

    /// Acquire a fresh video track only, used when switching cameras.
    async fn open_video(&self, constraints: &CaptureConstraints)
    -> Result<LocalTrack, CaptureError>;
}

/// Produces real sample tracks with no device behind them.
///
/// Negotiation works exactly as with a camera; nothing is written to the
/// tracks unless the caller pumps samples into [`LocalTrack::sample_source`].
pub struct SyntheticCapture {
    stream_id: String,
    counter: AtomicU64,
}

impl SyntheticCapture {
    pub fn new(stream_id: impl Into<String>) -> Self {
        Self {
            stream_id: stream_id.into(),
            counter: AtomicU64::new(0),
        }
    }

    fn track(&self, kind: TrackKind, constraints: &CaptureConstraints) -> LocalTrack {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        let codec = match kind {
            TrackKind::Audio => RTCRtpCodecCapability {
                mime_type: MIME_TYPE_OPUS.to_owned(),
                clock_rate: 48000,
                channels: 2,
                ..Default::default()
            },
            TrackKind::Video => RTCRtpCodecCapability {
                mime_type: MIME_TYPE_VP8.to_owned(),
                clock_rate: 90000,
                ..Default::default()
            },
        };
        let label = match kind {
            TrackKind::Audio => format!("audio-{n}"),
            TrackKind::Video => format!("video-{n}-{}x{}", constraints.width, constraints.height),
        };

        let source = TrackLocalStaticSample::new(codec, label, self.stream_id.clone());
        LocalTrack::new(kind, Arc::new(source))
    }
}

#[async_trait]
impl CaptureDevice for SyntheticCapture {
    async fn open(&self, constraints: &CaptureConstraints) -> Result<LocalCapture, CaptureError> {
        let mut tracks = Vec::with_capacity(2);
        if constraints.audio {
            tracks.push(self.track(TrackKind::Audio, constraints));
        }
        tracks.push(self.track(TrackKind::Video, constraints));
        Ok(LocalCapture::new(constraints.facing, tracks))
    }

    async fn open_video(
        &self,
        constraints: &CaptureConstraints,
    ) -> Result<LocalTrack, CaptureError> {
        Ok(self.track(TrackKind::Video, constraints))
    }
}
