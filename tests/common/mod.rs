//! Shared helpers: an in-process server on an ephemeral port and a thin
//! websocket client.

#![allow(dead_code, clippy::panic)]

use std::net::SocketAddr;
use std::time::Duration;

use chat_hub::api;
use chat_hub::app_state::AppState;
use chat_hub::config::HubConfig;
use chat_hub::domain::Hub;
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

pub type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

const WAIT: Duration = Duration::from_secs(5);

pub struct TestServer {
    pub addr: SocketAddr,
    pub hub: Hub,
}

impl TestServer {
    pub async fn start() -> Self {
        let hub = Hub::spawn();
        let app = api::build_router(AppState::new(hub.clone(), &HubConfig::default()));

        let Ok(listener) = TcpListener::bind("127.0.0.1:0").await else {
            panic!("bind failed");
        };
        let Ok(addr) = listener.local_addr() else {
            panic!("no local addr");
        };
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self { addr, hub }
    }

    pub fn http_url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    /// Connects and waits until the hub has registered the new session.
    pub async fn connect(&self, name: Option<&str>) -> Client {
        let before = self.connections().await;
        let url = match name {
            Some(name) => format!("ws://{}/ws/chat?name={name}", self.addr),
            None => format!("ws://{}/ws/chat", self.addr),
        };
        let Ok((client, _response)) = tokio_tungstenite::connect_async(url).await else {
            panic!("websocket connect failed");
        };
        self.wait_for_connections(before + 1).await;
        client
    }

    pub async fn connections(&self) -> usize {
        let Ok(n) = self.hub.connection_count().await else {
            panic!("hub unavailable");
        };
        n
    }

    pub async fn wait_for_connections(&self, expected: usize) {
        let deadline = tokio::time::Instant::now() + WAIT;
        while self.connections().await != expected {
            if tokio::time::Instant::now() > deadline {
                panic!("expected {expected} connections, have {}", self.connections().await);
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}

pub async fn send_text(client: &mut Client, text: &str) {
    if client.send(Message::text(text)).await.is_err() {
        panic!("send failed");
    }
}

/// Next chat message as JSON, skipping control frames.
pub async fn next_chat(client: &mut Client) -> serde_json::Value {
    let Ok(value) = tokio::time::timeout(WAIT, read_chat(client)).await else {
        panic!("no chat message within {WAIT:?}");
    };
    value
}

/// Asserts that no chat message arrives within `window`.
pub async fn assert_silent(client: &mut Client, window: Duration) {
    if let Ok(value) = tokio::time::timeout(window, read_chat(client)).await {
        panic!("unexpected chat message {value}");
    }
}

async fn read_chat(client: &mut Client) -> serde_json::Value {
    loop {
        match client.next().await {
            Some(Ok(Message::Text(text))) => {
                let Ok(value) = serde_json::from_str(text.as_str()) else {
                    panic!("server sent non-JSON text {}", text.as_str());
                };
                return value;
            }
            Some(Ok(_)) => {}
            other => panic!("connection ended: {other:?}"),
        }
    }
}

pub fn chat(name: &str, body: &str) -> serde_json::Value {
    serde_json::json!({ "Name": name, "Message": body })
}
