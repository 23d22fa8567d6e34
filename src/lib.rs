//! # chat-hub
//!
//! Real-time WebSocket broadcast hub. Clients connect to `/ws/chat`, and
//! every text message any of them sends is relayed to all connected
//! clients as `{"Name": ..., "Message": ...}`.
//!
//! ## Architecture
//!
//! ```text
//! Clients (WebSocket)
//!     │
//!     ├── Upgrade boundary (ws/handler)
//!     ├── Session driver, one task per connection (ws/session)
//!     │        │ register / deregister / broadcast
//!     │        ▼
//!     └── Hub loop, single owner of the connection set (domain/hub)
//!              │ non-blocking hand-off
//!              ▼
//!         per-connection outbox ──▶ session writer ──▶ socket
//! ```
//!
//! Delivery is best-effort and in-memory only: nothing is persisted, and a
//! client that joins late does not see earlier messages.

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod ws;
