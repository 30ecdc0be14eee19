use crate::error::NegotiationError;
use crate::media::LocalStream;
use crate::negotiation::NegotiationState;
use crate::signaling::SignalingChannel;
use crate::transport::PeerConnection;
use huddle_core::{IceCandidate, OutboundSignal, ParticipantId, SessionDescription};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Offer/answer/ICE exchange with one remote participant.
///
/// Owns the peer connection exclusively. Inbound candidates that arrive
/// before a remote description is set wait in a FIFO queue and are applied
/// as soon as one is.
pub struct NegotiationSession {
    peer_id: ParticipantId,
    connection_id: u64,
    connection: Box<dyn PeerConnection>,
    signaling: Arc<dyn SignalingChannel>,
    state: NegotiationState,
    pending_candidates: VecDeque<IceCandidate>,
    /// Set while the peer's losing glare offer is outstanding; its candidates
    /// belong to a connection the peer has discarded.
    discarding_remote_candidates: bool,
    local_media_attached: bool,
    local_description: Option<SessionDescription>,
    remote_description: Option<SessionDescription>,
    remote_streams: usize,
    last_transition: Instant,
}

impl NegotiationSession {
    pub fn new(
        peer_id: ParticipantId,
        connection_id: u64,
        connection: Box<dyn PeerConnection>,
        signaling: Arc<dyn SignalingChannel>,
    ) -> Self {
        Self {
            peer_id,
            connection_id,
            connection,
            signaling,
            state: NegotiationState::Idle,
            pending_candidates: VecDeque::new(),
            discarding_remote_candidates: false,
            local_media_attached: false,
            local_description: None,
            remote_description: None,
            remote_streams: 0,
            last_transition: Instant::now(),
        }
    }

    pub fn peer_id(&self) -> &ParticipantId {
        &self.peer_id
    }

    pub fn connection_id(&self) -> u64 {
        self.connection_id
    }

    pub fn state(&self) -> NegotiationState {
        self.state
    }

    pub fn pending_candidates(&self) -> usize {
        self.pending_candidates.len()
    }

    pub fn local_media_attached(&self) -> bool {
        self.local_media_attached
    }

    pub fn local_description(&self) -> Option<&SessionDescription> {
        self.local_description.as_ref()
    }

    pub fn remote_description(&self) -> Option<&SessionDescription> {
        self.remote_description.as_ref()
    }

    pub fn remote_streams(&self) -> usize {
        self.remote_streams
    }

    pub(crate) fn record_remote_stream(&mut self) {
        self.remote_streams += 1;
    }

    /// Whether an offer has been waiting for its counterpart longer than `timeout`.
    pub fn is_stalled(&self, now: Instant, timeout: Duration) -> bool {
        self.state.is_in_flight() && now.saturating_duration_since(self.last_transition) >= timeout
    }

    /// Attaches the local tracks once; later calls are no-ops.
    ///
    /// Tracks added to a `Stable` session only reach the peer after a
    /// renegotiation offer.
    pub async fn attach_local_media(&mut self, stream: &LocalStream) -> Result<(), NegotiationError> {
        if self.local_media_attached || self.state.is_closed() {
            return Ok(());
        }
        self.connection.add_local_stream(stream).await?;
        self.local_media_attached = true;
        debug!(
            "Attached local stream {} to session with {}",
            stream.stream_id(),
            self.peer_id
        );
        Ok(())
    }

    /// `Idle -> HaveLocalOffer`: creates, applies and sends a local offer.
    /// From `Stable` this renegotiates, e.g. after tracks were attached late.
    pub async fn create_offer(&mut self) -> Result<(), NegotiationError> {
        self.ensure_open()?;
        if !matches!(self.state, NegotiationState::Idle | NegotiationState::Stable) {
            return Err(NegotiationError::InvalidTransition {
                action: "create an offer",
                state: self.state,
            });
        }

        let offer = self.connection.create_offer().await?;
        self.connection.set_local_description(offer.clone()).await?;
        self.transition(NegotiationState::HaveLocalOffer);

        self.signaling
            .send(OutboundSignal::SendOffer {
                target_id: self.peer_id.clone(),
                offer: offer.to_json(),
            })
            .await;
        self.local_description = Some(offer);
        Ok(())
    }

    /// `Idle -> HaveRemoteOffer -> Stable`: applies the offer, drains queued
    /// candidates and answers it. A `Stable` session accepts a renegotiation
    /// offer the same way.
    pub async fn receive_offer(&mut self, offer: SessionDescription) -> Result<(), NegotiationError> {
        self.ensure_open()?;
        if !matches!(self.state, NegotiationState::Idle | NegotiationState::Stable) {
            return Err(NegotiationError::InvalidTransition {
                action: "accept an offer",
                state: self.state,
            });
        }

        self.connection.set_remote_description(offer.clone()).await?;
        self.remote_description = Some(offer);
        self.transition(NegotiationState::HaveRemoteOffer);
        self.drain_pending_candidates().await;

        let answer = self.connection.create_answer().await?;
        self.connection.set_local_description(answer.clone()).await?;
        self.transition(NegotiationState::Stable);

        self.signaling
            .send(OutboundSignal::SendAnswer {
                target_id: self.peer_id.clone(),
                answer: answer.to_json(),
            })
            .await;
        self.local_description = Some(answer);
        Ok(())
    }

    /// `HaveLocalOffer -> Stable`. Nothing is sent.
    pub async fn receive_answer(
        &mut self,
        answer: SessionDescription,
    ) -> Result<(), NegotiationError> {
        self.ensure_open()?;
        if self.state != NegotiationState::HaveLocalOffer {
            return Err(NegotiationError::InvalidTransition {
                action: "accept an answer",
                state: self.state,
            });
        }

        self.connection.set_remote_description(answer.clone()).await?;
        self.remote_description = Some(answer);
        self.discarding_remote_candidates = false;
        self.transition(NegotiationState::Stable);
        self.drain_pending_candidates().await;
        Ok(())
    }

    /// Applies the candidate now if a remote description is set, otherwise queues it.
    pub async fn receive_ice_candidate(
        &mut self,
        candidate: IceCandidate,
    ) -> Result<(), NegotiationError> {
        self.ensure_open()?;
        if self.discarding_remote_candidates {
            debug!(
                "Dropping candidate from {}, its offer lost the tie-break",
                self.peer_id
            );
            return Ok(());
        }
        if !self.state.has_remote_description() {
            debug!(
                "Queueing candidate from {} ({} pending)",
                self.peer_id,
                self.pending_candidates.len() + 1
            );
            self.pending_candidates.push_back(candidate);
            return Ok(());
        }

        self.connection.add_ice_candidate(candidate).await?;
        Ok(())
    }

    /// Ignores the peer's offer after winning a glare tie-break.
    ///
    /// Candidates queued so far and any that arrive before our answer is
    /// applied come from the peer's abandoned connection and are dropped.
    pub fn discard_remote_offer(&mut self) {
        let dropped = self.pending_candidates.len();
        self.pending_candidates.clear();
        self.discarding_remote_candidates = true;
        debug!(
            "Discarding offer from {} and {} queued candidate(s)",
            self.peer_id, dropped
        );
    }

    /// Discards the local offer after losing a glare tie-break: closes the
    /// current connection and continues from `Idle` on `connection`.
    ///
    /// Queued candidates are kept; they belong to the remote offer that is
    /// about to be answered.
    pub async fn rollback_with(&mut self, connection_id: u64, connection: Box<dyn PeerConnection>) {
        let previous = std::mem::replace(&mut self.connection, connection);
        if let Err(e) = previous.close().await {
            warn!("Failed to close superseded connection to {}: {}", self.peer_id, e);
        }

        info!(
            "Rolled back local offer to {} (connection {} -> {})",
            self.peer_id, self.connection_id, connection_id
        );
        self.connection_id = connection_id;
        self.local_description = None;
        self.remote_description = None;
        self.local_media_attached = false;
        self.discarding_remote_candidates = false;
        self.transition(NegotiationState::Idle);
    }

    /// Releases the connection and discards queued candidates.
    ///
    /// Returns `false` if the session was already closed.
    pub async fn close(&mut self) -> bool {
        if self.state.is_closed() {
            return false;
        }

        if let Err(e) = self.connection.close().await {
            warn!("Failed to close connection to {}: {}", self.peer_id, e);
        }
        self.pending_candidates.clear();
        self.transition(NegotiationState::Closed);
        info!("Closed session with {}", self.peer_id);
        true
    }

    fn ensure_open(&self) -> Result<(), NegotiationError> {
        if self.state.is_closed() {
            return Err(NegotiationError::StaleSignal(self.peer_id.clone()));
        }
        Ok(())
    }

    fn transition(&mut self, next: NegotiationState) {
        debug!("Session with {}: {:?} -> {:?}", self.peer_id, self.state, next);
        self.state = next;
        self.last_transition = Instant::now();
    }

    async fn drain_pending_candidates(&mut self) {
        while let Some(candidate) = self.pending_candidates.pop_front() {
            if let Err(e) = self.connection.add_ice_candidate(candidate).await {
                warn!("Failed to apply queued candidate from {}: {}", self.peer_id, e);
            }
        }
    }
}
