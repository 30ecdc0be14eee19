use crate::error::{CallError, MediaError, NegotiationError};
use crate::media::{LocalStream, MediaSink, MediaSource};
use crate::negotiation::{GlareOutcome, GlarePolicy, NegotiationSession, NegotiationState};
use crate::signaling::SignalingChannel;
use crate::transport::{
    PeerConnection, PeerConnectionFactory, TransportEvent, TransportEventKind,
    TransportEventSender,
};
use huddle_core::{
    IceCandidate, InboundSignal, OutboundSignal, ParticipantId, SdpType, SessionDescription,
};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// Owns one [`NegotiationSession`] per remote participant and routes
/// signaling and transport events to them.
pub struct PeerOrchestrator {
    local_id: Option<ParticipantId>,
    sessions: HashMap<ParticipantId, NegotiationSession>,
    /// Peers that left; their late signals are dropped until we call them again.
    departed: HashSet<ParticipantId>,
    factory: Arc<dyn PeerConnectionFactory>,
    signaling: Arc<dyn SignalingChannel>,
    media: MediaSource,
    sink: Arc<dyn MediaSink>,
    glare_policy: GlarePolicy,
    negotiation_timeout: Option<Duration>,
    next_connection_id: u64,
    transport_tx: mpsc::Sender<TransportEvent>,
    transport_rx: mpsc::Receiver<TransportEvent>,
}

impl PeerOrchestrator {
    pub fn new(
        factory: Arc<dyn PeerConnectionFactory>,
        signaling: Arc<dyn SignalingChannel>,
        media: MediaSource,
        sink: Arc<dyn MediaSink>,
    ) -> Self {
        let (transport_tx, transport_rx) = mpsc::channel(256);

        Self {
            local_id: None,
            sessions: HashMap::new(),
            departed: HashSet::new(),
            factory,
            signaling,
            media,
            sink,
            glare_policy: GlarePolicy::default(),
            negotiation_timeout: None,
            next_connection_id: 1,
            transport_tx,
            transport_rx,
        }
    }

    pub fn with_glare_policy(mut self, policy: GlarePolicy) -> Self {
        self.glare_policy = policy;
        self
    }

    pub fn with_negotiation_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.negotiation_timeout = timeout;
        self
    }

    pub fn set_local_id(&mut self, local_id: ParticipantId) {
        info!("Local participant id is {}", local_id);
        self.local_id = Some(local_id);
    }

    pub fn local_id(&self) -> Option<&ParticipantId> {
        self.local_id.as_ref()
    }

    pub fn glare_policy(&self) -> GlarePolicy {
        self.glare_policy
    }

    pub fn negotiation_timeout(&self) -> Option<Duration> {
        self.negotiation_timeout
    }

    pub fn session(&self, peer_id: &ParticipantId) -> Option<&NegotiationSession> {
        self.sessions.get(peer_id)
    }

    pub fn session_state(&self, peer_id: &ParticipantId) -> Option<NegotiationState> {
        self.sessions.get(peer_id).map(NegotiationSession::state)
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn peer_ids(&self) -> Vec<ParticipantId> {
        let mut ids: Vec<_> = self.sessions.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn is_departed(&self, peer_id: &ParticipantId) -> bool {
        self.departed.contains(peer_id)
    }

    pub fn local_stream(&self) -> Option<&LocalStream> {
        self.media.current()
    }

    /// Returns the session for `peer_id`, creating an `Idle` one if needed.
    pub async fn ensure_session(
        &mut self,
        peer_id: &ParticipantId,
    ) -> Result<&NegotiationSession, NegotiationError> {
        self.session_mut(peer_id).await.map(|session| &*session)
    }

    /// Acquires local media if needed and sends an offer to `peer_id`.
    ///
    /// A session that is already negotiating is left alone.
    pub async fn start_call_with(&mut self, peer_id: &ParticipantId) -> Result<(), CallError> {
        if self.local_id.as_ref() == Some(peer_id) {
            return Err(CallError::SelfCall(peer_id.clone()));
        }

        self.acquire_local_media().await?;
        self.departed.remove(peer_id);

        let session = self.session_mut(peer_id).await?;
        if session.state() != NegotiationState::Idle {
            debug!(
                "Call to {} skipped, session is {:?}",
                peer_id,
                session.state()
            );
            return Ok(());
        }

        info!("Starting call with {}", peer_id);
        session.create_offer().await?;
        Ok(())
    }

    /// Captures local media once and attaches it to every open session
    /// that does not carry it yet. Sessions that already finished
    /// negotiating are renegotiated so the peer receives the new tracks.
    pub async fn acquire_local_media(&mut self) -> Result<LocalStream, MediaError> {
        let stream = self.media.acquire().await?;

        for session in self.sessions.values_mut() {
            if session.local_media_attached() {
                continue;
            }
            if let Err(e) = session.attach_local_media(&stream).await {
                warn!(
                    "Failed to attach local media to {}: {}",
                    session.peer_id(),
                    e
                );
                continue;
            }
            if session.state() == NegotiationState::Stable {
                info!("Renegotiating with {} to send local media", session.peer_id());
                if let Err(e) = session.create_offer().await {
                    warn!("Renegotiation with {} failed: {}", session.peer_id(), e);
                }
            }
        }
        Ok(stream)
    }

    /// Routes an offer, answer or candidate to the sender's session.
    ///
    /// Failures are contained to that peer and only logged.
    pub async fn handle_signal(&mut self, signal: InboundSignal) {
        let Some(from) = signal.sender().cloned() else {
            debug!("Orchestrator ignores {}", signal.kind());
            return;
        };

        if self.departed.contains(&from) {
            warn!("Dropping {} from departed peer {}", signal.kind(), from);
            return;
        }
        if self.local_id.as_ref() == Some(&from) {
            warn!("Dropping {} addressed from ourselves", signal.kind());
            return;
        }

        let kind = signal.kind();
        let result = match signal {
            InboundSignal::ReceiveOffer { from, sdp } => self.on_offer(&from, &sdp).await,
            InboundSignal::ReceiveAnswer { from, sdp } => self.on_answer(&from, &sdp).await,
            InboundSignal::ReceiveIceCandidate { from, candidate } => {
                self.on_candidate(&from, &candidate).await
            }
            _ => Ok(()),
        };

        match result {
            Ok(()) => {}
            Err(e @ NegotiationError::MalformedPayload(_))
            | Err(e @ NegotiationError::StaleSignal(_))
            | Err(e @ NegotiationError::InvalidTransition { .. }) => {
                warn!("Dropped {} from {}: {}", kind, from, e);
            }
            Err(e) => error!("Failed to handle {} from {}: {}", kind, from, e),
        }
    }

    pub async fn handle_transport_event(&mut self, event: TransportEvent) {
        let TransportEvent {
            peer_id,
            connection_id,
            kind,
        } = event;

        let Some(session) = self.sessions.get_mut(&peer_id) else {
            debug!("Transport event for unknown peer {}", peer_id);
            return;
        };
        if session.connection_id() != connection_id {
            debug!(
                "Ignoring event from superseded connection {} of {}",
                connection_id, peer_id
            );
            return;
        }

        match kind {
            TransportEventKind::CandidateGenerated(candidate) => {
                self.signaling
                    .send(OutboundSignal::SendIceCandidate {
                        target_id: peer_id,
                        candidate: candidate.to_json(),
                    })
                    .await;
            }

            TransportEventKind::TrackAdded(stream) => {
                info!(
                    "Remote stream {} from {}",
                    stream.stream_id(),
                    peer_id
                );
                session.record_remote_stream();
                self.sink.on_remote_stream(&peer_id, stream).await;
            }

            TransportEventKind::Disconnected => {
                info!("Transport disconnected for {}", peer_id);
                self.drop_session(&peer_id).await;
            }
        }
    }

    /// Closes and forgets the session with a peer that left.
    ///
    /// Returns whether a session existed.
    pub async fn remove_peer(&mut self, peer_id: &ParticipantId) -> bool {
        self.departed.insert(peer_id.clone());
        self.drop_session(peer_id).await
    }

    /// Closes every session and releases the local media.
    pub async fn teardown_all(&mut self) {
        let peers: Vec<ParticipantId> = self.sessions.keys().cloned().collect();
        for peer_id in &peers {
            self.drop_session(peer_id).await;
        }
        self.media.release().await;
        info!("Tore down {} session(s)", peers.len());
    }

    /// Drops sessions whose offer has waited longer than the negotiation
    /// timeout. Expired peers may negotiate again later.
    pub async fn expire_stalled(&mut self, now: Instant) -> Vec<ParticipantId> {
        let Some(timeout) = self.negotiation_timeout else {
            return Vec::new();
        };

        let mut stalled: Vec<ParticipantId> = self
            .sessions
            .values()
            .filter(|session| session.is_stalled(now, timeout))
            .map(|session| session.peer_id().clone())
            .collect();
        stalled.sort();

        for peer_id in &stalled {
            warn!("Negotiation with {} timed out after {:?}", peer_id, timeout);
            self.drop_session(peer_id).await;
        }
        stalled
    }

    pub async fn next_transport_event(&mut self) -> Option<TransportEvent> {
        self.transport_rx.recv().await
    }

    pub fn try_next_transport_event(&mut self) -> Option<TransportEvent> {
        self.transport_rx.try_recv().ok()
    }

    async fn on_offer(&mut self, from: &ParticipantId, sdp: &str) -> Result<(), NegotiationError> {
        let offer = SessionDescription::parse(SdpType::Offer, sdp)?;

        if self.session_mut(from).await?.state() == NegotiationState::HaveLocalOffer {
            let outcome = match &self.local_id {
                Some(local_id) => self.glare_policy.resolve(local_id, from),
                None => GlareOutcome::YieldToRemote,
            };

            match outcome {
                GlareOutcome::KeepLocalOffer => {
                    info!("Glare with {}, keeping our offer", from);
                    self.session_mut(from).await?.discard_remote_offer();
                    return Ok(());
                }
                GlareOutcome::YieldToRemote => {
                    info!("Glare with {}, yielding to their offer", from);
                    self.rollback(from).await?;
                }
            }
        }

        self.session_mut(from).await?.receive_offer(offer).await
    }

    async fn on_answer(&mut self, from: &ParticipantId, sdp: &str) -> Result<(), NegotiationError> {
        let answer = SessionDescription::parse(SdpType::Answer, sdp)?;
        self.session_mut(from).await?.receive_answer(answer).await
    }

    async fn on_candidate(
        &mut self,
        from: &ParticipantId,
        payload: &str,
    ) -> Result<(), NegotiationError> {
        let candidate = IceCandidate::parse(payload)?;
        self.session_mut(from)
            .await?
            .receive_ice_candidate(candidate)
            .await
    }

    async fn rollback(&mut self, peer_id: &ParticipantId) -> Result<(), NegotiationError> {
        let (connection_id, connection) = self.new_connection(peer_id).await?;
        let stream = self.media.current().cloned();

        let session = self.session_mut(peer_id).await?;
        session.rollback_with(connection_id, connection).await;
        if let Some(stream) = stream {
            session.attach_local_media(&stream).await?;
        }
        Ok(())
    }

    async fn session_mut(
        &mut self,
        peer_id: &ParticipantId,
    ) -> Result<&mut NegotiationSession, NegotiationError> {
        if !self.sessions.contains_key(peer_id) {
            let session = self.create_session(peer_id).await?;
            self.sessions.insert(peer_id.clone(), session);
        }

        self.sessions
            .get_mut(peer_id)
            .ok_or_else(|| NegotiationError::StaleSignal(peer_id.clone()))
    }

    async fn create_session(
        &mut self,
        peer_id: &ParticipantId,
    ) -> Result<NegotiationSession, NegotiationError> {
        let (connection_id, connection) = self.new_connection(peer_id).await?;
        let mut session = NegotiationSession::new(
            peer_id.clone(),
            connection_id,
            connection,
            self.signaling.clone(),
        );

        if let Some(stream) = self.media.current()
            && let Err(e) = session.attach_local_media(stream).await
        {
            warn!("Failed to attach local media to {}: {}", peer_id, e);
        }

        info!("Created session with {}", peer_id);
        Ok(session)
    }

    async fn new_connection(
        &mut self,
        peer_id: &ParticipantId,
    ) -> Result<(u64, Box<dyn PeerConnection>), NegotiationError> {
        let connection_id = self.next_connection_id;
        self.next_connection_id += 1;

        let events =
            TransportEventSender::new(peer_id.clone(), connection_id, self.transport_tx.clone());
        let connection = self.factory.create(events).await?;
        Ok((connection_id, connection))
    }

    async fn drop_session(&mut self, peer_id: &ParticipantId) -> bool {
        let Some(mut session) = self.sessions.remove(peer_id) else {
            return false;
        };

        session.close().await;
        if session.remote_streams() > 0 {
            self.sink.on_stream_ended(peer_id).await;
        }
        true
    }
}
