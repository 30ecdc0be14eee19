use crate::error::MediaError;
use crate::media::LocalStream;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

/// Which local tracks to capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaConstraints {
    pub audio: bool,
    pub video: bool,
}

impl Default for MediaConstraints {
    fn default() -> Self {
        Self {
            audio: true,
            video: true,
        }
    }
}

/// Platform capture device access.
#[async_trait]
pub trait MediaCapture: Send + Sync {
    async fn capture(&self, constraints: &MediaConstraints) -> Result<LocalStream, MediaError>;

    /// Stops every track of a stream previously returned by `capture`.
    async fn stop(&self, stream: &LocalStream);
}

/// Acquires the local stream once and hands the cached handle to every session.
pub struct MediaSource {
    capture: Arc<dyn MediaCapture>,
    constraints: MediaConstraints,
    cached: Option<LocalStream>,
}

impl MediaSource {
    pub fn new(capture: Arc<dyn MediaCapture>, constraints: MediaConstraints) -> Self {
        Self {
            capture,
            constraints,
            cached: None,
        }
    }

    /// Returns the cached stream, capturing it on the first call.
    ///
    /// A denied capture is not cached, so a later call asks again.
    pub async fn acquire(&mut self) -> Result<LocalStream, MediaError> {
        if let Some(stream) = &self.cached {
            return Ok(stream.clone());
        }

        let stream = self.capture.capture(&self.constraints).await?;
        info!(
            "Captured local stream {} with {} track(s)",
            stream.stream_id(),
            stream.tracks().len()
        );
        self.cached = Some(stream.clone());
        Ok(stream)
    }

    pub fn current(&self) -> Option<&LocalStream> {
        self.cached.as_ref()
    }

    pub fn is_acquired(&self) -> bool {
        self.cached.is_some()
    }

    /// Stops all tracks and clears the cache. Does nothing if nothing was acquired.
    pub async fn release(&mut self) {
        let Some(stream) = self.cached.take() else {
            return;
        };
        debug!("Releasing local stream {}", stream.stream_id());
        self.capture.stop(&stream).await;
    }
}
