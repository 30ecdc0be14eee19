use crate::negotiation::NegotiationState;
use huddle_core::{InvocationError, ParticipantId, PayloadError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("media capture access denied: {0}")]
    AccessDenied(String),

    #[error("media capture failed: {0}")]
    Capture(String),
}

#[derive(Debug, Error)]
pub enum SignalingError {
    #[error("signaling server unavailable: {0}")]
    Unavailable(String),

    #[error("signaling channel is not connected")]
    NotConnected,

    #[error("failed to send {event}: {reason}")]
    SendFailed { event: &'static str, reason: String },
}

#[derive(Debug, Error)]
pub enum HubProtocolError {
    #[error("invalid hub record: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Invocation(#[from] InvocationError),

    #[error("hub rejected the handshake: {0}")]
    HandshakeRejected(String),

    #[error("hub handshake response is missing")]
    MissingHandshake,
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("webrtc error: {0}")]
    Rtc(#[from] webrtc::Error),

    #[error("unsupported description type: {0}")]
    UnsupportedDescription(String),
}

#[derive(Debug, Error)]
pub enum NegotiationError {
    /// A signal reached a session that was already closed.
    #[error("stale signal for closed session with {0}")]
    StaleSignal(ParticipantId),

    #[error("cannot {action} while {state:?}")]
    InvalidTransition {
        action: &'static str,
        state: NegotiationState,
    },

    #[error("malformed payload: {0}")]
    MalformedPayload(#[from] PayloadError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Failure to start a call with a peer.
#[derive(Debug, Error)]
pub enum CallError {
    #[error(transparent)]
    MediaAccessDenied(#[from] MediaError),

    #[error("cannot call own participant id {0}")]
    SelfCall(ParticipantId),

    #[error(transparent)]
    Negotiation(#[from] NegotiationError),
}

#[derive(Debug, Error)]
pub enum MeetingError {
    #[error(transparent)]
    Signaling(#[from] SignalingError),

    #[error(transparent)]
    Call(#[from] CallError),

    #[error("meeting session has not joined a meeting")]
    NotJoined,

    #[error("meeting session has ended")]
    SessionEnded,
}
