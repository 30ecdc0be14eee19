use crate::error::{CallError, MediaError};
use async_trait::async_trait;
use huddle_core::ParticipantId;

/// Application hooks for meeting-level events. All methods default to no-ops.
#[async_trait]
pub trait MeetingBehavior: Send + Sync + 'static {
    async fn on_joined(&self, _local_id: &ParticipantId) {}

    async fn on_message(&self, _text: &str) {}

    async fn on_participant_count(&self, _count: u32) {}

    /// Local capture was refused after joining; no calls are placed.
    async fn on_media_unavailable(&self, _error: &MediaError) {}

    /// A call the meeting placed by itself (on join or roster change) failed.
    async fn on_call_failed(&self, _peer_id: &ParticipantId, _error: &CallError) {}
}
