//! Per-connection session driver.
//!
//! A session registers its connection with the [`Hub`], turns every inbound
//! text frame into a broadcast, and leaves the hub when the client goes away.
//! Outbound traffic runs on a separate writer task that drains the
//! connection's outbox into the socket, so the hub never waits on a socket.

use std::time::Duration;

use axum::extract::ws::{Message, Utf8Bytes, WebSocket};
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinError;

use super::frame::Frame;
use crate::config::HubConfig;
use crate::domain::{ChatMessage, ConnectionHandle, ConnectionId, Hub};

/// Per-session knobs, taken from [`HubConfig`].
#[derive(Debug, Clone, Copy)]
pub struct SessionSettings {
    /// Outbox length for each connection.
    pub outbox_capacity: usize,
    /// Bound on a single socket write.
    pub send_timeout: Duration,
}

impl From<&HubConfig> for SessionSettings {
    fn from(config: &HubConfig) -> Self {
        Self {
            outbox_capacity: config.outbox_capacity,
            send_timeout: config.send_timeout,
        }
    }
}

/// Why the read side of a session stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReadEnd {
    Closed,
    Failed,
    HubGone,
}

/// Why the writer task stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriteEnd {
    /// The hub released the outbox; the socket was closed.
    Drained,
    Failed,
    TimedOut,
}

/// Keeps a connection registered for as long as it is alive.
///
/// Dropping it deregisters the connection, whichever way the session ends.
#[derive(Debug)]
struct Registration {
    hub: Hub,
    id: ConnectionId,
}

impl Registration {
    fn new(hub: Hub, handle: ConnectionHandle) -> Option<Self> {
        let id = handle.id();
        match hub.register(handle) {
            Ok(()) => Some(Self { hub, id }),
            Err(err) => {
                tracing::error!(connection_id = %id, error = %err, "could not register connection");
                None
            }
        }
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        if let Err(err) = self.hub.deregister(self.id) {
            tracing::debug!(connection_id = %self.id, error = %err, "deregister skipped");
        }
    }
}

/// Runs one upgraded websocket until the client leaves.
pub async fn run_session(socket: WebSocket, name: String, hub: Hub, settings: SessionSettings) {
    let (sink, stream) = socket.split();
    drive(sink, stream, name, hub, settings).await;
}

/// Session body over any message sink/stream pair.
///
/// Returns once the connection is deregistered and its writer has finished
/// (or been aborted after `send_timeout`).
pub async fn drive<W, R>(sink: W, stream: R, name: String, hub: Hub, settings: SessionSettings)
where
    W: Sink<Message, Error = axum::Error> + Unpin + Send + 'static,
    R: Stream<Item = Result<Message, axum::Error>> + Unpin,
{
    let id = ConnectionId::new();
    let (outbox, pending) = mpsc::channel(settings.outbox_capacity);
    let Some(registration) = Registration::new(
        hub.clone(),
        ConnectionHandle::new(id, name.clone(), outbox),
    ) else {
        return;
    };

    let mut writer = tokio::spawn(write_loop(sink, pending, settings.send_timeout, id));

    let writer_finished = tokio::select! {
        end = read_loop(stream, &name, &hub) => {
            tracing::debug!(connection_id = %id, ?end, "read side finished");
            false
        }
        joined = &mut writer => {
            log_writer_end(id, joined);
            true
        }
    };

    // Deregistration makes the hub drop its outbox sender, which lets the
    // writer drain and close the socket.
    drop(registration);

    if !writer_finished {
        match tokio::time::timeout(settings.send_timeout, &mut writer).await {
            Ok(joined) => log_writer_end(id, joined),
            Err(_) => {
                tracing::warn!(connection_id = %id, "writer did not finish in time; aborting");
                writer.abort();
            }
        }
    }
}

async fn read_loop<R>(mut stream: R, name: &str, hub: &Hub) -> ReadEnd
where
    R: Stream<Item = Result<Message, axum::Error>> + Unpin,
{
    while let Some(next) = stream.next().await {
        let message = match next {
            Ok(message) => message,
            Err(err) => {
                tracing::debug!(error = %err, "socket read failed");
                return ReadEnd::Failed;
            }
        };
        match Frame::from(message) {
            Frame::Text(body) => {
                if hub.broadcast(ChatMessage::new(name, body.as_str())).is_err() {
                    return ReadEnd::HubGone;
                }
            }
            Frame::Close => return ReadEnd::Closed,
            Frame::Other => {}
        }
    }
    ReadEnd::Closed
}

async fn write_loop<W>(
    mut sink: W,
    mut pending: mpsc::Receiver<Utf8Bytes>,
    send_timeout: Duration,
    id: ConnectionId,
) -> WriteEnd
where
    W: Sink<Message, Error = axum::Error> + Unpin,
{
    while let Some(payload) = pending.recv().await {
        match tokio::time::timeout(send_timeout, sink.send(Message::Text(payload))).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                tracing::debug!(connection_id = %id, error = %err, "socket write failed");
                return WriteEnd::Failed;
            }
            Err(_) => {
                tracing::warn!(
                    connection_id = %id,
                    timeout = ?send_timeout,
                    "socket write timed out; dropping connection"
                );
                return WriteEnd::TimedOut;
            }
        }
    }

    if let Ok(Err(err)) = tokio::time::timeout(send_timeout, sink.close()).await {
        tracing::debug!(connection_id = %id, error = %err, "socket close failed");
    }
    WriteEnd::Drained
}

fn log_writer_end(id: ConnectionId, joined: Result<WriteEnd, JoinError>) {
    match joined {
        Ok(end) => tracing::debug!(connection_id = %id, ?end, "writer finished"),
        Err(err) => tracing::error!(connection_id = %id, error = %err, "writer task failed"),
    }
}
