use crate::model::participant::{MeetingId, ParticipantId};
use serde::{Deserialize, Serialize};

/// Body of the meeting creation call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMeetingRequest {
    pub client_name: String,
    pub max_participants: u32,
    /// RFC 3339 timestamp of the scheduled start.
    pub start_time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMeetingResponse {
    pub id: MeetingId,
    pub client_id: ParticipantId,
}
