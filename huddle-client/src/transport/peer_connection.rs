use crate::error::TransportError;
use crate::media::LocalStream;
use crate::transport::TransportEventSender;
use async_trait::async_trait;
use huddle_core::{IceCandidate, SessionDescription};

/// The platform peer connection a negotiation session drives.
///
/// Every method is a suspension point; the session re-enters its state
/// machine with the result.
#[async_trait]
pub trait PeerConnection: Send + Sync {
    async fn create_offer(&self) -> Result<SessionDescription, TransportError>;

    async fn create_answer(&self) -> Result<SessionDescription, TransportError>;

    async fn set_local_description(&self, desc: SessionDescription) -> Result<(), TransportError>;

    async fn set_remote_description(&self, desc: SessionDescription)
    -> Result<(), TransportError>;

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<(), TransportError>;

    /// Attach every track of the local stream to this connection.
    async fn add_local_stream(&self, stream: &LocalStream) -> Result<(), TransportError>;

    async fn close(&self) -> Result<(), TransportError>;
}

/// Creates one peer connection per remote participant.
#[async_trait]
pub trait PeerConnectionFactory: Send + Sync {
    async fn create(
        &self,
        events: TransportEventSender,
    ) -> Result<Box<dyn PeerConnection>, TransportError>;
}
