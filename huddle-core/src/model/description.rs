use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Reasons an inbound description or candidate payload is rejected.
#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("payload is empty")]
    Empty,

    #[error("payload is not valid json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("expected an {expected} description, got an {actual}")]
    UnexpectedType { expected: SdpType, actual: SdpType },

    #[error("unrecognized payload: {0}")]
    Unrecognized(String),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SdpType {
    Offer,
    Answer,
}

impl fmt::Display for SdpType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SdpType::Offer => f.write_str("offer"),
            SdpType::Answer => f.write_str("answer"),
        }
    }
}

/// An SDP payload tagged with its role in the exchange.
///
/// Serializes as `{"type":"offer","sdp":"v=0..."}`, the shape browsers
/// produce for `RTCSessionDescription`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionDescription {
    #[serde(rename = "type")]
    pub sdp_type: SdpType,
    pub sdp: String,
}

impl SessionDescription {
    pub fn offer(sdp: impl Into<String>) -> Self {
        Self {
            sdp_type: SdpType::Offer,
            sdp: sdp.into(),
        }
    }

    pub fn answer(sdp: impl Into<String>) -> Self {
        Self {
            sdp_type: SdpType::Answer,
            sdp: sdp.into(),
        }
    }

    /// Parses a description received over signaling.
    ///
    /// Peers either send the JSON form or the bare SDP text; both are accepted.
    /// A JSON payload whose role differs from `expected` is rejected.
    pub fn parse(expected: SdpType, payload: &str) -> Result<Self, PayloadError> {
        let trimmed = payload.trim();
        if trimmed.is_empty() {
            return Err(PayloadError::Empty);
        }

        if trimmed.starts_with('{') {
            let desc: SessionDescription = serde_json::from_str(trimmed)?;
            if desc.sdp_type != expected {
                return Err(PayloadError::UnexpectedType {
                    expected,
                    actual: desc.sdp_type,
                });
            }
            if desc.sdp.trim().is_empty() {
                return Err(PayloadError::Empty);
            }
            return Ok(desc);
        }

        if trimmed.starts_with("v=") {
            return Ok(Self {
                sdp_type: expected,
                sdp: payload.to_owned(),
            });
        }

        Err(PayloadError::Unrecognized(preview(trimmed)))
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// A trickle ICE candidate in the browser's `RTCIceCandidateInit` shape.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IceCandidate {
    pub candidate: String,
    #[serde(default)]
    pub sdp_mid: Option<String>,
    #[serde(default, rename = "sdpMLineIndex")]
    pub sdp_m_line_index: Option<u16>,
    #[serde(default)]
    pub username_fragment: Option<String>,
}

impl IceCandidate {
    pub fn new(candidate: impl Into<String>) -> Self {
        Self {
            candidate: candidate.into(),
            sdp_mid: None,
            sdp_m_line_index: None,
            username_fragment: None,
        }
    }

    pub fn with_mid(mut self, sdp_mid: impl Into<String>, sdp_m_line_index: u16) -> Self {
        self.sdp_mid = Some(sdp_mid.into());
        self.sdp_m_line_index = Some(sdp_m_line_index);
        self
    }

    /// Accepts the JSON form or a bare `candidate:` line.
    pub fn parse(payload: &str) -> Result<Self, PayloadError> {
        let trimmed = payload.trim();
        if trimmed.is_empty() {
            return Err(PayloadError::Empty);
        }

        if trimmed.starts_with('{') {
            let candidate: IceCandidate = serde_json::from_str(trimmed)?;
            if candidate.candidate.trim().is_empty() {
                return Err(PayloadError::Empty);
            }
            return Ok(candidate);
        }

        if trimmed.starts_with("candidate:") {
            return Ok(Self::new(trimmed));
        }

        Err(PayloadError::Unrecognized(preview(trimmed)))
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

fn preview(payload: &str) -> String {
    payload.chars().take(32).collect()
}
