use crate::error::MediaError;
use bytes::Bytes;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use webrtc::media::Sample;
use webrtc::rtp_transceiver::rtp_codec::RTPCodecType;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;
use webrtc::track::track_remote::TrackRemote;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackKind {
    Audio,
    Video,
}

impl TrackKind {
    pub fn from_codec_type(codec_type: RTPCodecType) -> Option<Self> {
        match codec_type {
            RTPCodecType::Audio => Some(TrackKind::Audio),
            RTPCodecType::Video => Some(TrackKind::Video),
            _ => None,
        }
    }
}

/// The local capture handle shared by every peer connection.
///
/// Cloning is cheap; clones write into the same tracks.
#[derive(Clone)]
pub struct LocalStream {
    stream_id: String,
    tracks: Vec<Arc<TrackLocalStaticSample>>,
}

impl LocalStream {
    pub fn new(stream_id: impl Into<String>, tracks: Vec<Arc<TrackLocalStaticSample>>) -> Self {
        Self {
            stream_id: stream_id.into(),
            tracks,
        }
    }

    pub fn stream_id(&self) -> &str {
        &self.stream_id
    }

    pub fn tracks(&self) -> &[Arc<TrackLocalStaticSample>] {
        &self.tracks
    }

    pub fn track(&self, kind: TrackKind) -> Option<&Arc<TrackLocalStaticSample>> {
        self.tracks
            .iter()
            .find(|track| TrackKind::from_codec_type(track.kind()) == Some(kind))
    }

    /// Writes one already encoded frame to every peer that carries this stream.
    pub async fn write_sample(
        &self,
        kind: TrackKind,
        data: Bytes,
        duration: Duration,
    ) -> Result<(), MediaError> {
        let track = self.track(kind).ok_or_else(|| {
            MediaError::Capture(format!("stream {} has no {:?} track", self.stream_id, kind))
        })?;

        track
            .write_sample(&Sample {
                data,
                duration,
                ..Default::default()
            })
            .await
            .map_err(|e| MediaError::Capture(e.to_string()))
    }
}

impl fmt::Debug for LocalStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let track_ids: Vec<&str> = self.tracks.iter().map(|t| t.id()).collect();
        f.debug_struct("LocalStream")
            .field("stream_id", &self.stream_id)
            .field("tracks", &track_ids)
            .finish()
    }
}

/// Media a remote peer started sending, handed to the [`MediaSink`](crate::MediaSink).
#[derive(Clone)]
pub struct RemoteStream {
    stream_id: String,
    track_id: String,
    kind: Option<TrackKind>,
    track: Option<Arc<TrackRemote>>,
}

impl RemoteStream {
    pub fn from_track(track: Arc<TrackRemote>) -> Self {
        Self {
            stream_id: track.stream_id(),
            track_id: track.id(),
            kind: TrackKind::from_codec_type(track.kind()),
            track: Some(track),
        }
    }

    /// A stream descriptor with no underlying track, for transports that
    /// deliver media elsewhere.
    pub fn detached(
        stream_id: impl Into<String>,
        track_id: impl Into<String>,
        kind: TrackKind,
    ) -> Self {
        Self {
            stream_id: stream_id.into(),
            track_id: track_id.into(),
            kind: Some(kind),
            track: None,
        }
    }

    pub fn stream_id(&self) -> &str {
        &self.stream_id
    }

    pub fn track_id(&self) -> &str {
        &self.track_id
    }

    pub fn kind(&self) -> Option<TrackKind> {
        self.kind
    }

    /// The RTP track to read packets from.
    pub fn track(&self) -> Option<&Arc<TrackRemote>> {
        self.track.as_ref()
    }
}

impl fmt::Debug for RemoteStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteStream")
            .field("stream_id", &self.stream_id)
            .field("track_id", &self.track_id)
            .field("kind", &self.kind)
            .field("attached", &self.track.is_some())
            .finish()
    }
}
