//! chat-hub server entry point.
//!
//! Starts the hub loop and the Axum HTTP server.

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use chat_hub::api;
use chat_hub::app_state::AppState;
use chat_hub::config::{HubConfig, LogFormat};
use chat_hub::domain::Hub;

#[tokio::main]
async fn main() {
    let config = match HubConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("invalid configuration: {err:#}");
            std::process::exit(1);
        }
    };

    init_tracing(config.log_format);

    if let Err(err) = serve(config).await {
        tracing::error!(error = ?err, "server failed");
        std::process::exit(1);
    }
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match format {
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
    }
}

async fn serve(config: HubConfig) -> anyhow::Result<()> {
    tracing::info!(addr = %config.listen_addr, "starting chat-hub");

    let hub = Hub::spawn();
    let app = api::build_router(AppState::new(hub, &config));

    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}
