use crate::config::ClientConfig;
use crate::error::MeetingError;
use crate::media::{LocalStream, MediaSink, MediaSource, StaticTrackCapture};
use crate::meeting::{MeetingBehavior, MeetingCommand, MeetingHandle, Roster};
use crate::orchestrator::PeerOrchestrator;
use crate::signaling::{SignalingChannel, WsSignalingChannel};
use crate::transport::RtcConnectionFactory;
use huddle_core::{InboundSignal, MeetingId, OutboundSignal, ParticipantId, SignalKind};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at};
use tracing::{debug, error, info, warn};

const MIN_SWEEP_PERIOD: Duration = Duration::from_secs(1);

/// One participant's presence in one meeting.
///
/// Every reaction runs on the session's own loop ([`MeetingSession::run`]
/// or the `process_*` helpers), so signaling, transport and command events
/// never interleave inside a negotiation step.
pub struct MeetingSession {
    signaling: Arc<dyn SignalingChannel>,
    orchestrator: PeerOrchestrator,
    behavior: Arc<dyn MeetingBehavior>,
    roster: Roster,
    meeting_id: Option<MeetingId>,
    inbound_tx: mpsc::UnboundedSender<InboundSignal>,
    inbound_rx: mpsc::UnboundedReceiver<InboundSignal>,
    command_tx: mpsc::Sender<MeetingCommand>,
    command_rx: mpsc::Receiver<MeetingCommand>,
    handlers_registered: bool,
    sweep_period: Duration,
    sweep: Option<Interval>,
    ended: bool,
}

impl MeetingSession {
    pub fn new(
        signaling: Arc<dyn SignalingChannel>,
        orchestrator: PeerOrchestrator,
        behavior: Arc<dyn MeetingBehavior>,
    ) -> Self {
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let (command_tx, command_rx) = mpsc::channel(32);

        let sweep_period = orchestrator
            .negotiation_timeout()
            .map(|timeout| (timeout / 4).max(MIN_SWEEP_PERIOD))
            .unwrap_or(MIN_SWEEP_PERIOD);

        Self {
            signaling,
            orchestrator,
            behavior,
            roster: Roster::new(),
            meeting_id: None,
            inbound_tx,
            inbound_rx,
            command_tx,
            command_rx,
            handlers_registered: false,
            sweep_period,
            sweep: None,
            ended: false,
        }
    }

    /// Wires the WebSocket signaling client, `webrtc` peer connections and
    /// sample-track capture from configuration.
    pub fn from_config(
        config: &ClientConfig,
        behavior: Arc<dyn MeetingBehavior>,
        sink: Arc<dyn MediaSink>,
    ) -> Self {
        let signaling: Arc<dyn SignalingChannel> =
            Arc::new(WsSignalingChannel::new(config.signaling_url.clone()));
        let factory = Arc::new(RtcConnectionFactory::new(config.transport.clone()));
        let media = MediaSource::new(Arc::new(StaticTrackCapture::default()), config.media);

        let orchestrator = PeerOrchestrator::new(factory, signaling.clone(), media, sink)
            .with_glare_policy(config.glare_policy)
            .with_negotiation_timeout(config.negotiation_timeout);

        Self::new(signaling, orchestrator, behavior)
    }

    pub fn handle(&self) -> MeetingHandle {
        MeetingHandle::new(self.command_tx.clone())
    }

    pub fn meeting_id(&self) -> Option<&MeetingId> {
        self.meeting_id.as_ref()
    }

    pub fn local_id(&self) -> Option<&ParticipantId> {
        self.orchestrator.local_id()
    }

    pub fn participant_count(&self) -> u32 {
        self.roster.count()
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn orchestrator(&self) -> &PeerOrchestrator {
        &self.orchestrator
    }

    pub fn local_stream(&self) -> Option<&LocalStream> {
        self.orchestrator.local_stream()
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    /// Connects signaling, subscribes to every inbound event and asks the
    /// server to join. An empty `participant_id` lets the server assign one.
    pub async fn join(
        &mut self,
        meeting_id: MeetingId,
        participant_id: ParticipantId,
    ) -> Result<(), MeetingError> {
        if self.ended {
            return Err(MeetingError::SessionEnded);
        }

        if let Err(e) = self.signaling.connect().await {
            error!("Cannot join meeting {}: {}", meeting_id, e);
            return Err(e.into());
        }

        if !self.handlers_registered {
            for kind in SignalKind::ALL {
                let tx = self.inbound_tx.clone();
                self.signaling.on(
                    kind,
                    Arc::new(move |signal: &InboundSignal| {
                        let _ = tx.send(signal.clone());
                    }),
                );
            }
            self.handlers_registered = true;
        }

        info!("Joining meeting {}", meeting_id);
        self.meeting_id = Some(meeting_id.clone());
        self.signaling
            .send(OutboundSignal::JoinMeeting {
                meeting_id,
                participant_id,
            })
            .await;
        Ok(())
    }

    pub async fn handle_signal(&mut self, signal: InboundSignal) {
        if self.ended {
            debug!("Meeting ended, dropping {}", signal.kind());
            return;
        }

        match signal {
            InboundSignal::JoinedMeeting { participant_id } => {
                self.on_joined(participant_id).await;
            }

            InboundSignal::ReceiveNumberOfParticipants { count } => {
                debug!("Meeting now has {} participant(s)", count);
                self.roster.set_count(count);
                self.behavior.on_participant_count(count).await;
            }

            InboundSignal::ReceiveMessage { text } => {
                self.behavior.on_message(&text).await;
            }

            InboundSignal::ReceiveParticipants { participant_ids } => {
                let change = self.roster.replace_members(participant_ids);
                for peer_id in &change.removed {
                    self.orchestrator.remove_peer(peer_id).await;
                }
                if self.orchestrator.local_id().is_some() {
                    for peer_id in &change.added {
                        self.call_member(peer_id).await;
                    }
                }
                self.behavior
                    .on_participant_count(self.roster.count())
                    .await;
            }

            InboundSignal::ParticipantLeft { participant_id } => {
                info!("Participant {} left", participant_id);
                self.roster.remove(&participant_id);
                self.orchestrator.remove_peer(&participant_id).await;
            }

            signal @ (InboundSignal::ReceiveOffer { .. }
            | InboundSignal::ReceiveAnswer { .. }
            | InboundSignal::ReceiveIceCandidate { .. }) => {
                self.orchestrator.handle_signal(signal).await;
            }
        }
    }

    pub async fn start_call_with(&mut self, peer_id: &ParticipantId) -> Result<(), MeetingError> {
        self.ensure_active()?;
        self.orchestrator.start_call_with(peer_id).await?;
        Ok(())
    }

    pub async fn send_message(&mut self, text: impl Into<String>) -> Result<(), MeetingError> {
        self.ensure_active()?;
        let meeting_id = self.meeting_id.clone().ok_or(MeetingError::NotJoined)?;
        self.signaling
            .send(OutboundSignal::SendMessage {
                meeting_id,
                text: text.into(),
            })
            .await;
        Ok(())
    }

    /// Best-effort leave notification, then teardown of every session, the
    /// local media and the signaling connection. Later calls do nothing.
    pub async fn leave(&mut self) {
        if self.ended {
            return;
        }
        self.ended = true;

        if let Some(meeting_id) = self.meeting_id.clone() {
            info!("Leaving meeting {}", meeting_id);
            self.signaling
                .send(OutboundSignal::LeaveMeeting { meeting_id })
                .await;
        }

        self.orchestrator.teardown_all().await;
        self.signaling.disconnect().await;
    }

    /// Waits for and handles one event. Returns `false` once the session has ended.
    pub async fn process_next(&mut self) -> bool {
        if self.ended {
            return false;
        }

        let period = self.sweep_period;
        let sweep = self.sweep.get_or_insert_with(|| {
            let mut sweep = interval_at(Instant::now() + period, period);
            sweep.set_missed_tick_behavior(MissedTickBehavior::Delay);
            sweep
        });

        tokio::select! {
            biased;

            signal = self.inbound_rx.recv() => {
                if let Some(signal) = signal {
                    self.handle_signal(signal).await;
                }
            }

            event = self.orchestrator.next_transport_event() => {
                if let Some(event) = event {
                    self.orchestrator.handle_transport_event(event).await;
                }
            }

            cmd = self.command_rx.recv() => {
                if let Some(cmd) = cmd {
                    self.handle_command(cmd).await;
                }
            }

            now = sweep.tick() => {
                self.orchestrator.expire_stalled(now).await;
            }
        }

        !self.ended
    }

    /// Handles everything already queued without waiting. Returns how many
    /// events were processed.
    pub async fn process_pending(&mut self) -> usize {
        let mut processed = 0;

        loop {
            if let Ok(signal) = self.inbound_rx.try_recv() {
                self.handle_signal(signal).await;
            } else if let Some(event) = self.orchestrator.try_next_transport_event() {
                self.orchestrator.handle_transport_event(event).await;
            } else if let Ok(cmd) = self.command_rx.try_recv() {
                self.handle_command(cmd).await;
            } else {
                break;
            }
            processed += 1;
        }

        processed
    }

    /// Drops negotiations that have waited past the configured timeout.
    pub async fn expire_stalled(&mut self) -> Vec<ParticipantId> {
        self.orchestrator.expire_stalled(Instant::now()).await
    }

    /// Runs the event loop until the meeting is left.
    pub async fn run(mut self) {
        info!("Meeting event loop started");
        while self.process_next().await {}
        info!("Meeting event loop finished");
    }

    async fn handle_command(&mut self, cmd: MeetingCommand) {
        match cmd {
            MeetingCommand::StartCall { peer_id, reply } => {
                let result = self.start_call_with(&peer_id).await;
                let _ = reply.send(result);
            }

            MeetingCommand::SendMessage { text, reply } => {
                let result = self.send_message(text).await;
                let _ = reply.send(result);
            }

            MeetingCommand::Leave { reply } => {
                self.leave().await;
                let _ = reply.send(());
            }
        }
    }

    async fn on_joined(&mut self, participant_id: ParticipantId) {
        match &self.meeting_id {
            Some(meeting_id) => info!("Joined meeting {} as {}", meeting_id, participant_id),
            None => warn!("JoinedMeeting for {} before join", participant_id),
        }

        self.orchestrator.set_local_id(participant_id.clone());
        self.roster.set_local_id(participant_id.clone());
        self.behavior.on_joined(&participant_id).await;

        if let Err(e) = self.orchestrator.acquire_local_media().await {
            error!("Local media unavailable: {}", e);
            self.behavior.on_media_unavailable(&e).await;
            return;
        }

        let members: Vec<ParticipantId> = self.roster.members().cloned().collect();
        for peer_id in &members {
            self.call_member(peer_id).await;
        }
    }

    async fn call_member(&mut self, peer_id: &ParticipantId) {
        if self.orchestrator.session(peer_id).is_some() {
            return;
        }

        if let Err(e) = self.orchestrator.start_call_with(peer_id).await {
            warn!("Call to {} failed: {}", peer_id, e);
            self.behavior.on_call_failed(peer_id, &e).await;
        }
    }

    fn ensure_active(&self) -> Result<(), MeetingError> {
        if self.ended {
            return Err(MeetingError::SessionEnded);
        }
        if self.meeting_id.is_none() {
            return Err(MeetingError::NotJoined);
        }
        Ok(())
    }
}

