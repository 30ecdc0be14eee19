mod description;
mod event;
mod invocation;
mod meeting;
mod participant;
mod signaling;

pub use description::{IceCandidate, PayloadError, SdpType, SessionDescription};
pub use event::{InboundSignal, OutboundSignal, SignalKind};
pub use invocation::InvocationError;
pub use meeting::{CreateMeetingRequest, CreateMeetingResponse};
pub use participant::{MeetingId, ParticipantId};
pub use signaling::IceServerConfig;
