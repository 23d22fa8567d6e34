//! Connection registry and broadcast coordinator.
//!
//! The registry is owned by a single task, [`HubLoop`]. Everything else talks
//! to it through a [`Hub`] handle that enqueues requests on one FIFO intake
//! channel. Because only the loop ever reads the channel and only the loop
//! ever touches the map, register, deregister and broadcast are applied one
//! at a time without any lock around the registry.
//!
//! The intake is unbounded: enqueueing never waits, which lets the session
//! driver deregister from a `Drop` impl. Fan-out does not block either,
//! since each delivery is a non-blocking hand-off to the connection's own
//! bounded outbox (see [`ConnectionHandle::send`]).

use std::collections::HashMap;

use tokio::sync::{mpsc, oneshot};

use super::{ChatMessage, ConnectionHandle, ConnectionId};
use crate::error::ChatError;

/// A request for the coordinator loop.
#[derive(Debug)]
pub enum HubCommand {
    /// Start tracking a connection.
    Register(ConnectionHandle),
    /// Stop tracking a connection. No-op when it is not tracked.
    Deregister(ConnectionId),
    /// Deliver a message to every tracked connection.
    Broadcast(ChatMessage),
    /// Report how many connections are tracked.
    Count(oneshot::Sender<usize>),
}

/// Cloneable handle used to send requests to the coordinator.
#[derive(Debug, Clone)]
pub struct Hub {
    intake: mpsc::UnboundedSender<HubCommand>,
}

impl Hub {
    /// Creates a handle and the loop it feeds. The loop does nothing until
    /// [`HubLoop::run`] is polled.
    #[must_use]
    pub fn new() -> (Self, HubLoop) {
        let (intake, requests) = mpsc::unbounded_channel();
        let hub_loop = HubLoop {
            requests,
            connections: HashMap::new(),
        };
        (Self { intake }, hub_loop)
    }

    /// Creates a hub and spawns its loop on the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime, like [`tokio::spawn`].
    #[must_use]
    pub fn spawn() -> Self {
        let (hub, hub_loop) = Self::new();
        tokio::spawn(hub_loop.run());
        hub
    }

    /// Asks the hub to track `handle`.
    ///
    /// Callers must not register the same [`ConnectionId`] twice without a
    /// deregistration in between.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::HubUnavailable`] if the loop has stopped.
    pub fn register(&self, handle: ConnectionHandle) -> Result<(), ChatError> {
        self.submit(HubCommand::Register(handle))
    }

    /// Asks the hub to forget `id`.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::HubUnavailable`] if the loop has stopped.
    pub fn deregister(&self, id: ConnectionId) -> Result<(), ChatError> {
        self.submit(HubCommand::Deregister(id))
    }

    /// Asks the hub to deliver `message` to everyone currently tracked.
    ///
    /// Delivery failures are handled inside the hub and never reported here.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::HubUnavailable`] if the loop has stopped.
    pub fn broadcast(&self, message: ChatMessage) -> Result<(), ChatError> {
        self.submit(HubCommand::Broadcast(message))
    }

    /// Number of tracked connections, as seen after every request enqueued
    /// before this one has been applied.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::HubUnavailable`] if the loop has stopped.
    pub async fn connection_count(&self) -> Result<usize, ChatError> {
        let (reply, answer) = oneshot::channel();
        self.submit(HubCommand::Count(reply))?;
        answer.await.map_err(|_| ChatError::HubUnavailable)
    }

    fn submit(&self, command: HubCommand) -> Result<(), ChatError> {
        self.intake
            .send(command)
            .map_err(|_| ChatError::HubUnavailable)
    }
}

/// The coordinator task: sole owner of the connection registry.
#[derive(Debug)]
pub struct HubLoop {
    requests: mpsc::UnboundedReceiver<HubCommand>,
    connections: HashMap<ConnectionId, ConnectionHandle>,
}

impl HubLoop {
    /// Serves requests in arrival order until every [`Hub`] handle is gone.
    ///
    /// The application keeps a handle in its state for the whole process
    /// lifetime, so in practice this never returns.
    pub async fn run(mut self) {
        tracing::debug!("hub loop started");
        while let Some(command) = self.requests.recv().await {
            self.apply(command);
        }
        tracing::info!(
            connections = self.connections.len(),
            "hub loop stopped: all handles dropped"
        );
    }

    fn apply(&mut self, command: HubCommand) {
        match command {
            HubCommand::Register(handle) => {
                let id = handle.id();
                let name = handle.name().to_string();
                if self.connections.insert(id, handle).is_some() {
                    tracing::warn!(connection_id = %id, "connection registered twice");
                }
                tracing::info!(
                    connection_id = %id,
                    name = %name,
                    total = self.connections.len(),
                    "connection registered"
                );
            }
            HubCommand::Deregister(id) => {
                if let Some(handle) = self.connections.remove(&id) {
                    tracing::info!(
                        connection_id = %id,
                        name = handle.name(),
                        total = self.connections.len(),
                        "connection deregistered"
                    );
                }
            }
            HubCommand::Broadcast(message) => self.fan_out(&message),
            HubCommand::Count(reply) => {
                let _ = reply.send(self.connections.len());
            }
        }
    }

    fn fan_out(&self, message: &ChatMessage) {
        let payload = match message.to_payload() {
            Ok(payload) => payload,
            Err(err) => {
                tracing::error!(error = %err, "failed to encode chat message");
                return;
            }
        };

        let mut delivered = 0usize;
        for (id, handle) in &self.connections {
            match handle.send(payload.clone()) {
                Ok(()) => delivered += 1,
                Err(err) => {
                    tracing::warn!(connection_id = %id, error = %err, "broadcast delivery failed");
                }
            }
        }
        tracing::debug!(
            from = message.name(),
            recipients = self.connections.len(),
            delivered,
            "broadcast applied"
        );
    }
}
