use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackKind {
    Audio,
    Video,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraFacing {
    /// Selfie camera (`facingMode: user`).
    Front,
    /// Rear camera (`facingMode: environment`).
    Back,
}

impl CameraFacing {
    pub fn flipped(self) -> Self {
        match self {
            CameraFacing::Front => CameraFacing::Back,
            CameraFacing::Back => CameraFacing::Front,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CaptureConstraints {
    pub facing: CameraFacing,
    pub width: u32,
    pub height: u32,
    pub frame_rate: u32,
    pub audio: bool,
}

impl Default for CaptureConstraints {
    fn default() -> Self {
        Self {
            facing: CameraFacing::Front,
            width: 320,
            height: 240,
            frame_rate: 15,
            audio: true,
        }
    }
}

/// One outgoing track. Clones share the same liveness flag, so stopping any
/// clone stops the track for every session that holds it.
#[derive(Clone)]
pub struct LocalTrack {
    kind: TrackKind,
    enabled: bool,
    live: Arc<AtomicBool>,
    source: Arc<TrackLocalStaticSample>,
}

impl LocalTrack {
    pub fn new(kind: TrackKind, source: Arc<TrackLocalStaticSample>) -> Self {
        Self {
            kind,
            enabled: true,
            live: Arc::new(AtomicBool::new(true)),
            source,
        }
    }

    pub fn id(&self) -> &str {
        self.source.id()
    }

    pub fn kind(&self) -> TrackKind {
        self.kind
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Enabled and not yet stopped.
    pub fn is_live(&self) -> bool {
        self.enabled && self.live.load(Ordering::Acquire)
    }

    pub fn stop(&self) {
        self.live.store(false, Ordering::Release);
    }

    pub fn source(&self) -> Arc<dyn TrackLocal + Send + Sync> {
        Arc::clone(&self.source) as Arc<dyn TrackLocal + Send + Sync>
    }

    pub fn sample_source(&self) -> &Arc<TrackLocalStaticSample> {
        &self.source
    }
}

impl fmt::Debug for LocalTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalTrack")
            .field("id", &self.id())
            .field("kind", &self.kind)
            .field("live", &self.is_live())
            .finish()
    }
}

/// The media source acquired from the device while broadcasting.
#[derive(Debug, Clone)]
pub struct LocalCapture {
    facing: CameraFacing,
    tracks: Vec<LocalTrack>,
}

impl LocalCapture {
    pub fn new(facing: CameraFacing, tracks: Vec<LocalTrack>) -> Self {
        Self { facing, tracks }
    }

    pub fn facing(&self) -> CameraFacing {
        self.facing
    }

    pub fn tracks(&self) -> &[LocalTrack] {
        &self.tracks
    }

    pub fn live_tracks(&self) -> Vec<LocalTrack> {
        self.tracks.iter().filter(|t| t.is_live()).cloned().collect()
    }

    pub fn has_live_tracks(&self) -> bool {
        self.tracks.iter().any(LocalTrack::is_live)
    }

    pub fn video(&self) -> Option<&LocalTrack> {
        self.tracks.iter().find(|t| t.kind == TrackKind::Video)
    }

    /// Swaps the video track in place and stops the one it replaces.
    pub fn replace_video(&mut self, track: LocalTrack, facing: CameraFacing) {
        self.facing = facing;
        if let Some(old) = self.tracks.iter_mut().find(|t| t.kind == TrackKind::Video) {
            old.stop();
            *old = track;
        } else {
            self.tracks.push(track);
        }
    }

    pub fn stop(&self) {
        for track in &self.tracks {
            track.stop();
        }
    }
}
