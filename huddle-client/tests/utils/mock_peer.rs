use async_trait::async_trait;
use huddle_client::{
    LocalStream, PeerConnection, PeerConnectionFactory, TransportError, TransportEventSender,
};
use huddle_core::{IceCandidate, ParticipantId, SdpType, SessionDescription};
use std::sync::{Arc, Mutex};

/// One call made on a mock peer connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerCall {
    CreateOffer,
    CreateAnswer,
    SetLocal(SdpType),
    SetRemote(SdpType),
    AddCandidate(String),
    AddLocalStream(String),
    Close,
}

/// Test-side view of a connection the mock factory created.
#[derive(Clone)]
pub struct MockConnectionHandle {
    pub peer_id: ParticipantId,
    pub connection_id: u64,
    events: TransportEventSender,
    calls: Arc<Mutex<Vec<PeerCall>>>,
}

impl MockConnectionHandle {
    /// The sender the orchestrator handed to this connection, for emitting
    /// transport events as if the platform produced them.
    pub fn events(&self) -> TransportEventSender {
        self.events.clone()
    }

    pub fn calls(&self) -> Vec<PeerCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Candidate lines applied to this connection, in order.
    pub fn applied_candidates(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                PeerCall::AddCandidate(candidate) => Some(candidate),
                _ => None,
            })
            .collect()
    }

    pub fn close_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| **call == PeerCall::Close)
            .count()
    }

    pub fn is_closed(&self) -> bool {
        self.close_count() > 0
    }
}

struct MockPeerConnection {
    label: String,
    calls: Arc<Mutex<Vec<PeerCall>>>,
}

impl MockPeerConnection {
    fn record(&self, call: PeerCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl PeerConnection for MockPeerConnection {
    async fn create_offer(&self) -> Result<SessionDescription, TransportError> {
        self.record(PeerCall::CreateOffer);
        Ok(SessionDescription::offer(format!(
            "v=0\r\no=- {} offer\r\ns=-\r\n",
            self.label
        )))
    }

    async fn create_answer(&self) -> Result<SessionDescription, TransportError> {
        self.record(PeerCall::CreateAnswer);
        Ok(SessionDescription::answer(format!(
            "v=0\r\no=- {} answer\r\ns=-\r\n",
            self.label
        )))
    }

    async fn set_local_description(&self, desc: SessionDescription) -> Result<(), TransportError> {
        self.record(PeerCall::SetLocal(desc.sdp_type));
        Ok(())
    }

    async fn set_remote_description(
        &self,
        desc: SessionDescription,
    ) -> Result<(), TransportError> {
        self.record(PeerCall::SetRemote(desc.sdp_type));
        Ok(())
    }

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<(), TransportError> {
        self.record(PeerCall::AddCandidate(candidate.candidate));
        Ok(())
    }

    async fn add_local_stream(&self, stream: &LocalStream) -> Result<(), TransportError> {
        self.record(PeerCall::AddLocalStream(stream.stream_id().to_owned()));
        Ok(())
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.record(PeerCall::Close);
        Ok(())
    }
}

/// Mock PeerConnectionFactory that records every connection it creates.
#[derive(Clone, Default)]
pub struct MockConnectionFactory {
    created: Arc<Mutex<Vec<MockConnectionHandle>>>,
}

impl MockConnectionFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn created_count(&self) -> usize {
        self.created.lock().unwrap().len()
    }

    /// Every connection created for `peer_id`, oldest first.
    pub fn connections_for(&self, peer_id: &ParticipantId) -> Vec<MockConnectionHandle> {
        self.created
            .lock()
            .unwrap()
            .iter()
            .filter(|handle| &handle.peer_id == peer_id)
            .cloned()
            .collect()
    }

    /// The most recent connection created for `peer_id`.
    pub fn latest_for(&self, peer_id: &ParticipantId) -> Option<MockConnectionHandle> {
        self.connections_for(peer_id).pop()
    }
}

#[async_trait]
impl PeerConnectionFactory for MockConnectionFactory {
    async fn create(
        &self,
        events: TransportEventSender,
    ) -> Result<Box<dyn PeerConnection>, TransportError> {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let handle = MockConnectionHandle {
            peer_id: events.peer_id().clone(),
            connection_id: events.connection_id(),
            events: events.clone(),
            calls: calls.clone(),
        };
        let label = format!("{}-{}", events.peer_id(), events.connection_id());
        self.created.lock().unwrap().push(handle);

        Ok(Box::new(MockPeerConnection { label, calls }))
    }
}
