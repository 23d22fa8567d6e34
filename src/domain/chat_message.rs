//! The message relayed to every connected client.

use axum::extract::ws::Utf8Bytes;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One chat line: the sender's display name and the text they sent.
///
/// Built fresh for every inbound text frame and never mutated afterwards.
/// On the wire it is a bare JSON object:
///
/// ```json
/// { "Name": "alice", "Message": "hi" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ChatMessage {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Message")]
    body: String,
}

impl ChatMessage {
    /// Creates a message from a sender label and a text body.
    #[must_use]
    pub fn new(name: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            body: body.into(),
        }
    }

    /// Display name of the sender.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Text payload.
    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Renders the wire form once so every recipient shares the same bytes.
    ///
    /// # Errors
    ///
    /// Returns the underlying [`serde_json::Error`] if serialization fails.
    pub fn to_payload(&self) -> Result<Utf8Bytes, serde_json::Error> {
        serde_json::to_string(self).map(Utf8Bytes::from)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn wire_field_names() {
        let msg = ChatMessage::new("alice", "hi");
        let Ok(payload) = msg.to_payload() else {
            panic!("serialization failed");
        };
        let Ok(value) = serde_json::from_str::<serde_json::Value>(payload.as_str()) else {
            panic!("payload is not JSON");
        };
        assert_eq!(value, serde_json::json!({ "Name": "alice", "Message": "hi" }));
    }

    #[test]
    fn body_is_not_reinterpreted() {
        let msg = ChatMessage::new("bob", r#"{"Name":"mallory"}"#);
        let Ok(payload) = msg.to_payload() else {
            panic!("serialization failed");
        };
        let Ok(parsed) = serde_json::from_str::<ChatMessage>(payload.as_str()) else {
            panic!("payload did not parse back");
        };
        assert_eq!(parsed.name(), "bob");
        assert_eq!(parsed.body(), r#"{"Name":"mallory"}"#);
    }
}
