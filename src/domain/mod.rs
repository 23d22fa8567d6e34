//! Domain layer: connection identity, chat messages, and the hub.
//!
//! The [`Hub`] owns the set of live connections and is the only writer of
//! application messages to them. Sessions talk to it exclusively through
//! [`HubCommand`]s.

pub mod chat_message;
pub mod connection;
pub mod connection_id;
pub mod hub;

pub use chat_message::ChatMessage;
pub use connection::{ConnectionHandle, DeliveryError};
pub use connection_id::ConnectionId;
pub use hub::{Hub, HubCommand, HubLoop};
