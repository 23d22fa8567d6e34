//! Hub-side handle to a single client connection.

use axum::extract::ws::Utf8Bytes;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use super::ConnectionId;

/// Why a payload could not be handed to a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DeliveryError {
    /// The connection's outbound queue is full; the payload was dropped.
    #[error("outbound queue full")]
    Backlogged,

    /// The connection's writer has stopped; nothing will be delivered.
    #[error("connection writer closed")]
    Closed,
}

/// What the hub holds for each registered connection.
///
/// The socket itself stays with the session driver. The hub only gets the
/// sending half of the session's outbox, so the hub never blocks on a slow
/// socket and only the session ever closes it.
///
/// Equality is by [`ConnectionId`] alone.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    name: String,
    outbox: mpsc::Sender<Utf8Bytes>,
}

impl ConnectionHandle {
    /// Wraps an outbox sender for the connection `id`.
    #[must_use]
    pub fn new(id: ConnectionId, name: impl Into<String>, outbox: mpsc::Sender<Utf8Bytes>) -> Self {
        Self {
            id,
            name: name.into(),
            outbox,
        }
    }

    /// Connection identity.
    #[must_use]
    pub const fn id(&self) -> ConnectionId {
        self.id
    }

    /// Display name the client connected with.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Queues `payload` for the connection's writer without waiting.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError::Backlogged`] when the outbox is full and
    /// [`DeliveryError::Closed`] when the writer has gone away.
    pub fn send(&self, payload: Utf8Bytes) -> Result<(), DeliveryError> {
        self.outbox.try_send(payload).map_err(|err| match err {
            TrySendError::Full(_) => DeliveryError::Backlogged,
            TrySendError::Closed(_) => DeliveryError::Closed,
        })
    }
}

impl PartialEq for ConnectionHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ConnectionHandle {}
