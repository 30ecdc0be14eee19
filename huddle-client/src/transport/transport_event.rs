use crate::media::RemoteStream;
use huddle_core::{IceCandidate, ParticipantId};
use tokio::sync::mpsc;
use tracing::debug;

/// Events a peer connection produces for the orchestrator.
#[derive(Debug)]
pub struct TransportEvent {
    pub peer_id: ParticipantId,
    /// Identifies the connection that produced the event; sessions that
    /// replaced their connection ignore events from the old one.
    pub connection_id: u64,
    pub kind: TransportEventKind,
}

#[derive(Debug)]
pub enum TransportEventKind {
    /// A local ICE candidate was gathered and must be sent to the peer.
    CandidateGenerated(IceCandidate),

    /// The peer started sending a media track.
    TrackAdded(RemoteStream),

    /// The connection failed or was closed underneath us.
    Disconnected,
}

/// Handle given to a peer connection to report its events.
#[derive(Clone)]
pub struct TransportEventSender {
    peer_id: ParticipantId,
    connection_id: u64,
    tx: mpsc::Sender<TransportEvent>,
}

impl TransportEventSender {
    pub fn new(peer_id: ParticipantId, connection_id: u64, tx: mpsc::Sender<TransportEvent>) -> Self {
        Self {
            peer_id,
            connection_id,
            tx,
        }
    }

    pub fn peer_id(&self) -> &ParticipantId {
        &self.peer_id
    }

    pub fn connection_id(&self) -> u64 {
        self.connection_id
    }

    pub async fn candidate_generated(&self, candidate: IceCandidate) {
        self.emit(TransportEventKind::CandidateGenerated(candidate))
            .await;
    }

    pub async fn track_added(&self, stream: RemoteStream) {
        self.emit(TransportEventKind::TrackAdded(stream)).await;
    }

    pub async fn disconnected(&self) {
        self.emit(TransportEventKind::Disconnected).await;
    }

    async fn emit(&self, kind: TransportEventKind) {
        let event = TransportEvent {
            peer_id: self.peer_id.clone(),
            connection_id: self.connection_id,
            kind,
        };
        if self.tx.send(event).await.is_err() {
            debug!(
                "Transport event for {} dropped, orchestrator is gone",
                self.peer_id
            );
        }
    }
}
