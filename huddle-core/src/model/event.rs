use crate::model::participant::{MeetingId, ParticipantId};
use std::fmt;

/// Named events the client sends to the rendezvous server.
///
/// Descriptions and candidates travel as JSON strings so that the server
/// relays them without looking inside.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundSignal {
    JoinMeeting {
        meeting_id: MeetingId,
        participant_id: ParticipantId,
    },
    SendOffer {
        target_id: ParticipantId,
        offer: String,
    },
    SendAnswer {
        target_id: ParticipantId,
        answer: String,
    },
    SendIceCandidate {
        target_id: ParticipantId,
        candidate: String,
    },
    SendMessage {
        meeting_id: MeetingId,
        text: String,
    },
    LeaveMeeting {
        meeting_id: MeetingId,
    },
}

impl OutboundSignal {
    pub fn name(&self) -> &'static str {
        match self {
            OutboundSignal::JoinMeeting { .. } => "JoinMeeting",
            OutboundSignal::SendOffer { .. } => "SendOffer",
            OutboundSignal::SendAnswer { .. } => "SendAnswer",
            OutboundSignal::SendIceCandidate { .. } => "SendIceCandidate",
            OutboundSignal::SendMessage { .. } => "SendMessage",
            OutboundSignal::LeaveMeeting { .. } => "LeaveMeeting",
        }
    }

    /// The peer this message is addressed to, for peer-to-peer relays.
    pub fn target(&self) -> Option<&ParticipantId> {
        match self {
            OutboundSignal::SendOffer { target_id, .. }
            | OutboundSignal::SendAnswer { target_id, .. }
            | OutboundSignal::SendIceCandidate { target_id, .. } => Some(target_id),
            _ => None,
        }
    }
}

/// Named events the rendezvous server delivers to the client.
///
/// `ReceiveParticipants` and `ParticipantLeft` are optional: servers that
/// only broadcast a participant count never send them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundSignal {
    JoinedMeeting {
        participant_id: ParticipantId,
    },
    ReceiveOffer {
        from: ParticipantId,
        sdp: String,
    },
    ReceiveAnswer {
        from: ParticipantId,
        sdp: String,
    },
    ReceiveIceCandidate {
        from: ParticipantId,
        candidate: String,
    },
    ReceiveNumberOfParticipants {
        count: u32,
    },
    ReceiveMessage {
        text: String,
    },
    ReceiveParticipants {
        participant_ids: Vec<ParticipantId>,
    },
    ParticipantLeft {
        participant_id: ParticipantId,
    },
}

impl InboundSignal {
    pub fn kind(&self) -> SignalKind {
        match self {
            InboundSignal::JoinedMeeting { .. } => SignalKind::JoinedMeeting,
            InboundSignal::ReceiveOffer { .. } => SignalKind::ReceiveOffer,
            InboundSignal::ReceiveAnswer { .. } => SignalKind::ReceiveAnswer,
            InboundSignal::ReceiveIceCandidate { .. } => SignalKind::ReceiveIceCandidate,
            InboundSignal::ReceiveNumberOfParticipants { .. } => {
                SignalKind::ReceiveNumberOfParticipants
            }
            InboundSignal::ReceiveMessage { .. } => SignalKind::ReceiveMessage,
            InboundSignal::ReceiveParticipants { .. } => SignalKind::ReceiveParticipants,
            InboundSignal::ParticipantLeft { .. } => SignalKind::ParticipantLeft,
        }
    }

    /// The remote peer a negotiation event came from.
    pub fn sender(&self) -> Option<&ParticipantId> {
        match self {
            InboundSignal::ReceiveOffer { from, .. }
            | InboundSignal::ReceiveAnswer { from, .. }
            | InboundSignal::ReceiveIceCandidate { from, .. } => Some(from),
            _ => None,
        }
    }
}

/// Event names used as keys of the handler dispatch table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalKind {
    JoinedMeeting,
    ReceiveOffer,
    ReceiveAnswer,
    ReceiveIceCandidate,
    ReceiveNumberOfParticipants,
    ReceiveMessage,
    ReceiveParticipants,
    ParticipantLeft,
}

impl SignalKind {
    pub const ALL: [SignalKind; 8] = [
        SignalKind::JoinedMeeting,
        SignalKind::ReceiveOffer,
        SignalKind::ReceiveAnswer,
        SignalKind::ReceiveIceCandidate,
        SignalKind::ReceiveNumberOfParticipants,
        SignalKind::ReceiveMessage,
        SignalKind::ReceiveParticipants,
        SignalKind::ParticipantLeft,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SignalKind::JoinedMeeting => "JoinedMeeting",
            SignalKind::ReceiveOffer => "ReceiveOffer",
            SignalKind::ReceiveAnswer => "ReceiveAnswer",
            SignalKind::ReceiveIceCandidate => "ReceiveIceCandidate",
            SignalKind::ReceiveNumberOfParticipants => "ReceiveNumberOfParticipants",
            SignalKind::ReceiveMessage => "ReceiveMessage",
            SignalKind::ReceiveParticipants => "ReceiveParticipants",
            SignalKind::ParticipantLeft => "ParticipantLeft",
        }
    }
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
