//! Protocol events and the line dispatcher.
//!
//! Lines of interest look like `data: {"type": "...", ...}`. Anything else,
//! including comments, `[DONE]` sentinels and garbled JSON, is skipped.

use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::trace;

/// Prefix of lines that carry a payload.
pub const DATA_PREFIX: &str = "data:";

/// Message used when an `error` event carries no usable `message`.
pub const DEFAULT_ERROR_MESSAGE: &str = "generation failed";

/// A decoded application-level event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolEvent {
    /// A non-empty fragment of narrative text.
    Content(String),
    /// Out-of-band notification, forwarded as the whole payload object.
    Analysis(Value),
    /// The remote service finished generating.
    Done,
    /// The remote service failed. Fatal for the session.
    Error(String),
    /// A well-formed payload with a kind this crate does not know.
    Unknown {
        /// Value of the `type` field.
        kind: String,
        /// The whole payload object.
        payload: Value,
    },
}

impl ProtocolEvent {
    /// Short name of the event kind, as it appears on the wire.
    pub fn kind(&self) -> &str {
        match self {
            Self::Content(_) => "content",
            Self::Analysis(_) => "analysis",
            Self::Done => "done",
            Self::Error(_) => "error",
            Self::Unknown { kind, .. } => kind,
        }
    }
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    content: Option<Value>,
    #[serde(default)]
    message: Option<Value>,
}

/// Parse one complete protocol line.
///
/// Returns `None` for lines without the `data:` prefix, empty or
/// unparsable payloads, payloads without a string `type`, and `content`
/// events whose text is empty or not a string.
pub fn parse_line(line: &str) -> Option<ProtocolEvent> {
    let Some(rest) = line.strip_prefix(DATA_PREFIX) else {
        trace!(line, "ignoring non-data line");
        return None;
    };

    let payload = rest.trim();
    if payload.is_empty() {
        return None;
    }

    let value: Value = match serde_json::from_str(payload) {
        Ok(value) => value,
        Err(err) => {
            trace!(%err, payload, "skipping unparsable payload");
            return None;
        }
    };

    // Sequence payloads would otherwise deserialize into the envelope by position
    if !value.is_object() {
        trace!(payload, "skipping non-object payload");
        return None;
    }

    let envelope = match Envelope::deserialize(&value) {
        Ok(envelope) => envelope,
        Err(err) => {
            trace!(%err, "skipping payload without a type");
            return None;
        }
    };

    match envelope.kind.as_str() {
        "content" => match envelope.content {
            Some(Value::String(text)) if !text.is_empty() => Some(ProtocolEvent::Content(text)),
            _ => {
                trace!("ignoring empty content event");
                None
            }
        },
        "analysis" => Some(ProtocolEvent::Analysis(value)),
        "done" => Some(ProtocolEvent::Done),
        "error" => {
            let message = match envelope.message {
                Some(Value::String(message)) => message,
                _ => DEFAULT_ERROR_MESSAGE.to_string(),
            };
            Some(ProtocolEvent::Error(message))
        }
        _ => Some(ProtocolEvent::Unknown {
            kind: envelope.kind,
            payload: value,
        }),
    }
}

/// Encode an event as one wire frame: `data: {json}\n\n`.
pub fn encode_event(event: &ProtocolEvent) -> String {
    let payload = match event {
        ProtocolEvent::Content(text) => json!({ "type": "content", "content": text }),
        ProtocolEvent::Analysis(payload) => tagged("analysis", payload),
        ProtocolEvent::Done => json!({ "type": "done" }),
        ProtocolEvent::Error(message) => json!({ "type": "error", "message": message }),
        ProtocolEvent::Unknown { kind, payload } => tagged(kind, payload),
    };
    format!("{DATA_PREFIX} {payload}\n\n")
}

/// Insert the `type` discriminant into an object payload.
/// Non-object payloads are wrapped under `payload`.
fn tagged(kind: &str, payload: &Value) -> Value {
    let mut object = match payload {
        Value::Object(map) => map.clone(),
        other => {
            let mut map = Map::new();
            map.insert("payload".to_string(), other.clone());
            map
        }
    };
    object.insert("type".to_string(), Value::String(kind.to_string()));
    Value::Object(object)
}
