//! Axum WebSocket upgrade boundary.

use axum::Router;
use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{Query, Request, State};
use axum::http::HeaderMap;
use axum::http::header::{CONNECTION, UPGRADE};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use serde::Deserialize;

use super::session::run_session;
use crate::app_state::AppState;
use crate::error::ChatError;

/// Path prefix gated by [`require_upgrade`].
pub const WS_PREFIX: &str = "/ws";

/// Name used when a client connects without `?name=`.
pub const DEFAULT_NAME: &str = "anonymous";

/// Query parameters accepted on `/ws/chat`.
#[derive(Debug, Default, Deserialize)]
pub struct ChatParams {
    /// Display name attached to every message this client sends.
    pub name: Option<String>,
}

impl ChatParams {
    /// The display name, or [`DEFAULT_NAME`] when absent or empty.
    #[must_use]
    pub fn display_name(self) -> String {
        self.name
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| DEFAULT_NAME.to_string())
    }
}

/// `GET /ws/chat` — Upgrade to a chat session.
pub async fn chat_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<ChatParams>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let name = params.display_name();
    let hub = state.hub.clone();
    let settings = state.session;

    ws.max_message_size(state.max_message_bytes)
        .on_upgrade(move |socket| run_session(socket, name, hub, settings))
}

/// Returns `true` when the headers ask for a websocket upgrade.
#[must_use]
pub fn is_websocket_upgrade(headers: &HeaderMap) -> bool {
    let upgrade = headers
        .get(UPGRADE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.trim().eq_ignore_ascii_case("websocket"));
    let connection = headers
        .get(CONNECTION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| {
            v.split(',')
                .any(|token| token.trim().eq_ignore_ascii_case("upgrade"))
        });
    upgrade && connection
}

/// Returns `true` for `/ws` and every path below it.
#[must_use]
pub fn is_ws_path(path: &str) -> bool {
    path.strip_prefix(WS_PREFIX)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

/// Rejects anything under `/ws` that is not a websocket upgrade, whether or
/// not a route matches it. Other paths pass through untouched.
///
/// Meant to wrap the whole application router.
///
/// # Errors
///
/// Returns [`ChatError::UpgradeRequired`] (426) for plain HTTP requests.
pub async fn require_upgrade(request: Request, next: Next) -> Result<Response, ChatError> {
    if is_ws_path(request.uri().path()) && !is_websocket_upgrade(request.headers()) {
        return Err(ChatError::UpgradeRequired);
    }
    Ok(next.run(request).await)
}

/// WebSocket routes, to be nested under [`WS_PREFIX`].
pub fn routes() -> Router<AppState> {
    Router::new().route("/chat", get(chat_handler))
}
