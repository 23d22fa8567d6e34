//! WebSocket layer: upgrade handling, frame classification, sessions.
//!
//! `/ws/chat?name=<display name>` upgrades to a chat session. Every text
//! frame a client sends is relayed by the hub to all connected clients.

pub mod frame;
pub mod handler;
pub mod session;
