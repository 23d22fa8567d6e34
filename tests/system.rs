//! HTTP-level checks: health endpoint and the upgrade pre-check.

#![allow(clippy::panic, clippy::indexing_slicing)]

mod common;

use common::TestServer;

#[tokio::test]
async fn health_reports_connection_count() {
    let server = TestServer::start().await;
    let _alice = server.connect(Some("alice")).await;

    let Ok(response) = reqwest::get(server.http_url("/health")).await else {
        panic!("health request failed");
    };
    assert_eq!(response.status(), reqwest::StatusCode::OK);

    let Ok(body) = response.json::<serde_json::Value>().await else {
        panic!("health body is not JSON");
    };
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["connections"], 1);
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn plain_request_to_chat_requires_upgrade() {
    let server = TestServer::start().await;

    let Ok(response) = reqwest::get(server.http_url("/ws/chat?name=alice")).await else {
        panic!("request failed");
    };
    assert_eq!(response.status(), reqwest::StatusCode::UPGRADE_REQUIRED);

    let Ok(body) = response.json::<serde_json::Value>().await else {
        panic!("error body is not JSON");
    };
    assert_eq!(body["error"]["code"], 1001);
    assert_eq!(server.connections().await, 0);
}

#[tokio::test]
async fn plain_request_anywhere_under_ws_requires_upgrade() {
    let server = TestServer::start().await;

    for path in ["/ws", "/ws/", "/ws/other"] {
        let Ok(response) = reqwest::get(server.http_url(path)).await else {
            panic!("request to {path} failed");
        };
        assert_eq!(
            response.status(),
            reqwest::StatusCode::UPGRADE_REQUIRED,
            "{path}"
        );
        let Ok(body) = response.json::<serde_json::Value>().await else {
            panic!("error body for {path} is not JSON");
        };
        assert_eq!(body["error"]["code"], 1001, "{path}");
    }
}

#[tokio::test]
async fn paths_outside_ws_are_not_gated() {
    let server = TestServer::start().await;

    let Ok(response) = reqwest::get(server.http_url("/wsx")).await else {
        panic!("request failed");
    };
    assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);
}
