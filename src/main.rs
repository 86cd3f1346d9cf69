//! Bot Web API - Main Entry Point
//!
//! Loads configuration, prepares the attachments directory and serves the
//! REST gateway until Ctrl-C.

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bot_web_api::{ApiConfig, AppState, BridgeClient, run_server};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,bot_web_api=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("🚀 Bot Web API starting...");

    // Load configuration
    let config = ApiConfig::from_env()?;
    info!("📋 Configuration loaded for bot {}", config.bot_username);

    let addr: SocketAddr = config
        .listen_addr
        .parse()
        .with_context(|| format!("Invalid listen address {}", config.listen_addr))?;

    let backend = Arc::new(BridgeClient::new(config.bridge_url.clone()));
    info!("🔗 Messaging bridge at {}", config.bridge_url);

    let state = AppState::new(config, backend);
    state
        .attachments
        .ensure_dir()
        .await
        .with_context(|| format!("Cannot create {:?}", state.attachments.dir()))?;
    info!("📁 Attachments directory {:?}", state.attachments.dir());

    run_server(addr, state, shutdown_signal()).await?;

    info!("✅ Bot Web API stopped");
    Ok(())
}

/// Resolve on Ctrl-C
async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("📢 Shutdown signal received"),
        Err(err) => {
            tracing::error!("Unable to listen for shutdown signal: {}", err);
            std::future::pending::<()>().await;
        }
    }
}
