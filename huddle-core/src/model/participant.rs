use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier the signaling server assigns to a participant on join.
///
/// Ordering is plain lexicographic ordering of the underlying string.
#[derive(Debug, Serialize, Deserialize, Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Default)]
#[serde(transparent)]
pub struct ParticipantId(String);

impl ParticipantId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// An empty id asks the server to assign one.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for ParticipantId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for ParticipantId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Hash, Eq, PartialEq)]
#[serde(transparent)]
pub struct MeetingId(String);

impl MeetingId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for MeetingId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for MeetingId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for MeetingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
