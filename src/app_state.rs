//! Shared application state injected into all Axum handlers.

use crate::config::HubConfig;
use crate::domain::Hub;
use crate::ws::session::SessionSettings;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Request handle for the connection hub.
    pub hub: Hub,
    /// Settings handed to every new chat session.
    pub session: SessionSettings,
    /// Largest inbound websocket message accepted, in bytes.
    pub max_message_bytes: usize,
}

impl AppState {
    /// Bundles a running hub with the session-related parts of `config`.
    #[must_use]
    pub fn new(hub: Hub, config: &HubConfig) -> Self {
        Self {
            hub,
            session: SessionSettings::from(config),
            max_message_bytes: config.max_message_bytes,
        }
    }
}
