use async_trait::async_trait;
use huddle_client::{LocalStream, MediaCapture, MediaConstraints, MediaError};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

pub const MOCK_STREAM_ID: &str = "mock-local";

/// Mock MediaCapture that grants or denies access and counts requests.
#[derive(Clone, Default)]
pub struct MockCapture {
    denied: Arc<AtomicBool>,
    captures: Arc<AtomicUsize>,
    stops: Arc<AtomicUsize>,
}

impl MockCapture {
    pub fn granting() -> Self {
        Self::default()
    }

    pub fn denying() -> Self {
        let capture = Self::default();
        capture.denied.store(true, Ordering::SeqCst);
        capture
    }

    pub fn set_denied(&self, denied: bool) {
        self.denied.store(denied, Ordering::SeqCst);
    }

    pub fn capture_count(&self) -> usize {
        self.captures.load(Ordering::SeqCst)
    }

    pub fn stop_count(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaCapture for MockCapture {
    async fn capture(&self, _constraints: &MediaConstraints) -> Result<LocalStream, MediaError> {
        self.captures.fetch_add(1, Ordering::SeqCst);
        if self.denied.load(Ordering::SeqCst) {
            return Err(MediaError::AccessDenied("permission dismissed".to_owned()));
        }
        Ok(LocalStream::new(MOCK_STREAM_ID, Vec::new()))
    }

    async fn stop(&self, _stream: &LocalStream) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }
}
