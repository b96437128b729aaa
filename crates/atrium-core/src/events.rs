use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// An event accepted by the bus. Carries everything except the timestamp,
/// which is stamped when the event is serialized for delivery.
#[derive(Clone, Debug, PartialEq)]
pub struct CallbackEvent {
    pub kind: String,
    pub message: Option<String>,
    pub payload: Option<serde_json::Value>,
}

impl CallbackEvent {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: None,
            payload: None,
        }
    }

    /// The acknowledgment pushed through a channel immediately after it
    /// is registered.
    pub fn connected() -> Self {
        Self {
            kind: "connected".into(),
            message: Some("Callback stream connected".into()),
            payload: None,
        }
    }

    /// An inbound webhook callback addressed to a session.
    pub fn callback(payload: serde_json::Value) -> Self {
        Self {
            kind: "callback".into(),
            message: Some("Callback payload received".into()),
            payload: Some(payload),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Stamp the event with the current wall-clock time. Called once per
    /// publish, so concurrent publishes may carry timestamps out of order
    /// relative to call order.
    pub fn stamp(self) -> WireEvent {
        WireEvent {
            kind: self.kind,
            message: self.message,
            payload: self.payload,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

/// The wire form of an event, one JSON object per SSE `data:` line.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct WireEvent {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
    pub timestamp: String,
}
