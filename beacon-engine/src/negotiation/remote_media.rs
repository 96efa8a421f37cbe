use crate::capture::TrackKind;
use crate::transport::RemoteTrackInfo;

/// Inbound media from one peer, composed from the tracks it has delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteMediaHandle {
    pub stream_id: String,
    pub tracks: Vec<(String, TrackKind)>,
}

impl RemoteMediaHandle {
    pub fn from_track(info: RemoteTrackInfo) -> Self {
        Self {
            stream_id: info.stream_id,
            tracks: vec![(info.track_id, info.kind)],
        }
    }

    /// Add a track, ignoring repeats of the same track id.
    pub fn merge(&mut self, info: RemoteTrackInfo) {
        if self.tracks.iter().any(|(id, _)| *id == info.track_id) {
            return;
        }
        self.tracks.push((info.track_id, info.kind));
    }

    pub fn has(&self, kind: TrackKind) -> bool {
        self.tracks.iter().any(|(_, k)| *k == kind)
    }
}
