//! Positional hub arguments for the named signaling events.
//!
//! The meeting hub invokes methods by name with an argument list, e.g.
//! `SendOffer(targetId, offer)` or `ReceiveOffer(from, sdp)`. These helpers
//! map the typed events onto that list and back.

use crate::model::event::{InboundSignal, OutboundSignal, SignalKind};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InvocationError {
    #[error("unknown hub method {0}")]
    UnknownTarget(String),

    #[error("{target} is missing argument {index}")]
    MissingArgument { target: &'static str, index: usize },

    #[error("{target} argument {index} is invalid: {source}")]
    InvalidArgument {
        target: &'static str,
        index: usize,
        source: serde_json::Error,
    },
}

impl OutboundSignal {
    /// Arguments in the order the hub method declares them.
    pub fn arguments(&self) -> Vec<Value> {
        match self {
            OutboundSignal::JoinMeeting {
                meeting_id,
                participant_id,
            } => vec![json!(meeting_id), json!(participant_id)],
            OutboundSignal::SendOffer { target_id, offer } => vec![json!(target_id), json!(offer)],
            OutboundSignal::SendAnswer { target_id, answer } => {
                vec![json!(target_id), json!(answer)]
            }
            OutboundSignal::SendIceCandidate {
                target_id,
                candidate,
            } => vec![json!(target_id), json!(candidate)],
            OutboundSignal::SendMessage { meeting_id, text } => vec![json!(meeting_id), json!(text)],
            OutboundSignal::LeaveMeeting { meeting_id } => vec![json!(meeting_id)],
        }
    }
}

impl InboundSignal {
    /// Builds the event for a client method the hub invoked.
    pub fn from_invocation(target: &str, arguments: &[Value]) -> Result<Self, InvocationError> {
        let kind = SignalKind::ALL
            .into_iter()
            .find(|kind| kind.name() == target)
            .ok_or_else(|| InvocationError::UnknownTarget(target.to_owned()))?;
        let args = Arguments {
            target: kind.name(),
            values: arguments,
        };

        let signal = match kind {
            SignalKind::JoinedMeeting => InboundSignal::JoinedMeeting {
                participant_id: args.get(0)?,
            },
            SignalKind::ReceiveOffer => InboundSignal::ReceiveOffer {
                from: args.get(0)?,
                sdp: args.get(1)?,
            },
            SignalKind::ReceiveAnswer => InboundSignal::ReceiveAnswer {
                from: args.get(0)?,
                sdp: args.get(1)?,
            },
            SignalKind::ReceiveIceCandidate => InboundSignal::ReceiveIceCandidate {
                from: args.get(0)?,
                candidate: args.get(1)?,
            },
            SignalKind::ReceiveNumberOfParticipants => InboundSignal::ReceiveNumberOfParticipants {
                count: args.get(0)?,
            },
            SignalKind::ReceiveMessage => InboundSignal::ReceiveMessage {
                text: args.get(0)?,
            },
            SignalKind::ReceiveParticipants => InboundSignal::ReceiveParticipants {
                participant_ids: args.get(0)?,
            },
            SignalKind::ParticipantLeft => InboundSignal::ParticipantLeft {
                participant_id: args.get(0)?,
            },
        };
        Ok(signal)
    }
}

struct Arguments<'a> {
    target: &'static str,
    values: &'a [Value],
}

impl Arguments<'_> {
    fn get<T: DeserializeOwned>(&self, index: usize) -> Result<T, InvocationError> {
        let value = self
            .values
            .get(index)
            .ok_or(InvocationError::MissingArgument {
                target: self.target,
                index,
            })?;
        T::deserialize(value).map_err(|source| InvocationError::InvalidArgument {
            target: self.target,
            index,
            source,
        })
    }
}
