//! Inbound frame classification.

use axum::extract::ws::{Message, Utf8Bytes};

/// What a session cares about in an inbound websocket message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// A text frame; its body is broadcast.
    Text(Utf8Bytes),
    /// The client started the closing handshake.
    Close,
    /// Binary, ping or pong. Ignored.
    Other,
}

impl From<Message> for Frame {
    fn from(message: Message) -> Self {
        match message {
            Message::Text(body) => Self::Text(body),
            Message::Close(_) => Self::Close,
            Message::Binary(_) | Message::Ping(_) | Message::Pong(_) => Self::Other,
        }
    }
}
