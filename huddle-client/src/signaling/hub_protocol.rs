//! Framing for the SignalR JSON hub protocol.
//!
//! Every record is a JSON object terminated by `0x1E`; one WebSocket frame
//! may carry several. The connection opens with a handshake record in each
//! direction, then carries invocations (`type` 1), pings (6) and a close (7).

use crate::error::HubProtocolError;
use huddle_core::{InboundSignal, OutboundSignal};
use serde::Deserialize;
use serde_json::{Value, json};

pub const RECORD_SEPARATOR: char = '\u{1e}';

const INVOCATION: u8 = 1;
const PING: u8 = 6;
const CLOSE: u8 = 7;

/// A decoded record from the hub.
#[derive(Debug, PartialEq)]
pub enum HubMessage {
    Invocation(InboundSignal),
    Ping,
    Close { error: Option<String> },
    /// Completions, stream items and other records a client without
    /// outstanding invocations can skip.
    Ignored(u8),
}

#[derive(Deserialize)]
struct RawRecord {
    #[serde(rename = "type")]
    kind: Option<u8>,
    target: Option<String>,
    #[serde(default)]
    arguments: Vec<Value>,
    error: Option<String>,
}

pub fn handshake_request() -> String {
    frame(json!({ "protocol": "json", "version": 1 }))
}

/// A fire-and-forget invocation; no `invocationId`, so the hub sends no completion.
pub fn encode_invocation(signal: &OutboundSignal) -> String {
    frame(json!({
        "type": INVOCATION,
        "target": signal.name(),
        "arguments": signal.arguments(),
    }))
}

pub fn ping() -> String {
    frame(json!({ "type": PING }))
}

/// Non-empty records of one frame, without their terminators.
pub fn records(frame: &str) -> impl Iterator<Item = &str> {
    frame
        .split(RECORD_SEPARATOR)
        .filter(|record| !record.trim().is_empty())
}

/// Checks the hub's handshake response at the start of `frame` and returns
/// whatever records followed it in the same frame.
pub fn accept_handshake(frame: &str) -> Result<&str, HubProtocolError> {
    let (response, rest) = frame
        .split_once(RECORD_SEPARATOR)
        .ok_or(HubProtocolError::MissingHandshake)?;

    let raw: RawRecord = serde_json::from_str(response)?;
    if let Some(error) = raw.error {
        return Err(HubProtocolError::HandshakeRejected(error));
    }
    Ok(rest)
}

pub fn decode_record(record: &str) -> Result<HubMessage, HubProtocolError> {
    let raw: RawRecord = serde_json::from_str(record)?;

    let message = match raw.kind {
        Some(INVOCATION) => {
            let target = raw.target.unwrap_or_default();
            HubMessage::Invocation(InboundSignal::from_invocation(&target, &raw.arguments)?)
        }
        Some(PING) => HubMessage::Ping,
        Some(CLOSE) => HubMessage::Close { error: raw.error },
        Some(other) => HubMessage::Ignored(other),
        None => HubMessage::Ignored(0),
    };
    Ok(message)
}

fn frame(record: Value) -> String {
    format!("{record}{RECORD_SEPARATOR}")
}
