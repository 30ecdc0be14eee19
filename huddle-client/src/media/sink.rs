use crate::media::RemoteStream;
use async_trait::async_trait;
use huddle_core::ParticipantId;

/// Receives remote media as peers start sending it.
#[async_trait]
pub trait MediaSink: Send + Sync + 'static {
    async fn on_remote_stream(&self, peer_id: &ParticipantId, stream: RemoteStream);

    /// The peer's session was closed; any surface showing its media can go.
    async fn on_stream_ended(&self, _peer_id: &ParticipantId) {}
}
