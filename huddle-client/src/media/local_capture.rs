use crate::error::MediaError;
use crate::media::{LocalStream, MediaCapture, MediaConstraints};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;
use webrtc::api::media_engine::{MIME_TYPE_OPUS, MIME_TYPE_VP8};
use webrtc::rtp_transceiver::rtp_codec::RTCRtpCodecCapability;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;

/// Capture backed by sample tracks the application feeds with encoded
/// frames through [`LocalStream::write_sample`].
#[derive(Debug, Clone)]
pub struct StaticTrackCapture {
    stream_id: String,
}

impl StaticTrackCapture {
    pub fn new(stream_id: impl Into<String>) -> Self {
        Self {
            stream_id: stream_id.into(),
        }
    }
}

impl Default for StaticTrackCapture {
    fn default() -> Self {
        Self::new("huddle-local")
    }
}

#[async_trait]
impl MediaCapture for StaticTrackCapture {
    async fn capture(&self, constraints: &MediaConstraints) -> Result<LocalStream, MediaError> {
        let mut tracks = Vec::new();

        if constraints.audio {
            tracks.push(Arc::new(TrackLocalStaticSample::new(
                RTCRtpCodecCapability {
                    mime_type: MIME_TYPE_OPUS.to_owned(),
                    clock_rate: 48_000,
                    channels: 2,
                    ..Default::default()
                },
                "audio".to_owned(),
                self.stream_id.clone(),
            )));
        }

        if constraints.video {
            tracks.push(Arc::new(TrackLocalStaticSample::new(
                RTCRtpCodecCapability {
                    mime_type: MIME_TYPE_VP8.to_owned(),
                    clock_rate: 90_000,
                    ..Default::default()
                },
                "video".to_owned(),
                self.stream_id.clone(),
            )));
        }

        if tracks.is_empty() {
            return Err(MediaError::Capture(
                "neither audio nor video was requested".to_owned(),
            ));
        }

        Ok(LocalStream::new(self.stream_id.clone(), tracks))
    }

    async fn stop(&self, stream: &LocalStream) {
        // Sample tracks hold no device; dropping the last handle stops them.
        debug!("Stopped local stream {}", stream.stream_id());
    }
}
