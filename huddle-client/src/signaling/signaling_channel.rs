use crate::error::SignalingError;
use crate::signaling::SignalHandler;
use async_trait::async_trait;
use huddle_core::{OutboundSignal, SignalKind};
use tracing::warn;

/// Named-message transport to the rendezvous server.
#[async_trait]
pub trait SignalingChannel: Send + Sync {
    /// Connecting an already connected channel is a no-op.
    async fn connect(&self) -> Result<(), SignalingError>;

    async fn disconnect(&self);

    async fn try_send(&self, signal: OutboundSignal) -> Result<(), SignalingError>;

    /// Fire-and-forget send; failures are logged, never returned.
    async fn send(&self, signal: OutboundSignal) {
        let name = signal.name();
        if let Err(e) = self.try_send(signal).await {
            warn!("Dropped outbound {}: {}", name, e);
        }
    }

    fn on(&self, kind: SignalKind, handler: SignalHandler);
}
