//! Grok Relay - Headless Daemon
//!
//! A pure Rust HTTP server that:
//! - Owns the token pool and its background workers
//! - Exposes the tool surface (converse, image, video, models) on /tools/*
//! - Provides a small admin API for pool maintenance on /admin/*
//!
//! Access via: http://localhost:8045

use anyhow::{Context, Result};
use grokrelay_core::config::get_data_dir;
use grokrelay_core::storage::{SqliteStore, Store};
use grokrelay_core::upstream::GrokHttpClient;
use grokrelay_core::{RelayConfig, TokenPool, ToolService};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod api;
mod state;

use state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = RelayConfig::load().map_err(|e| anyhow::anyhow!(e))?;
    info!("Grok Relay starting on port {}...", config.server.port);

    let data_dir = get_data_dir().map_err(|e| anyhow::anyhow!(e))?;

    // Startup order: store -> load -> workers. A store outage here is fatal;
    // running blind with zero tokens must not silently mask it.
    let store = Arc::new(SqliteStore::new(data_dir.join("relay.db")));
    store.init().await.context("store initialization failed")?;

    let pool = Arc::new(TokenPool::new(store, config.pool.clone()));
    let loaded = pool.load().await.context("token load failed")?;
    info!("Loaded {} token(s) into the pool", loaded);

    seed_tokens_from_env(&pool);
    pool.start_workers().await;

    let backend = Arc::new(
        GrokHttpClient::new(&config.upstream)
            .map_err(|e| anyhow::anyhow!("upstream client: {}", e))?,
    );
    let tools = Arc::new(ToolService::new(
        pool.clone(),
        backend,
        config.upstream.asset_host.clone(),
    ));

    let app_state = AppState {
        pool: pool.clone(),
        tools,
        api_key: config.server.api_key.clone(),
    };
    let app = api::build_router(app_state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("invalid listen address")?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("Server listening on http://{}", addr);
    info!("Tool API available at http://{}/tools/", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // LIFO teardown: the pool stops its workers and flushes once.
    info!("Shutting down...");
    pool.shutdown().await;
    info!("Shutdown complete");

    Ok(())
}

/// Insert credentials from `GROKRELAY_TOKENS` (comma-separated).
///
/// Idempotent against tokens already in the store; new ones enter as
/// Unknown and are promoted on the first refresh tick.
fn seed_tokens_from_env(pool: &TokenPool) {
    let Ok(raw) = std::env::var("GROKRELAY_TOKENS") else {
        return;
    };

    let mut seeded = 0;
    for value in raw.split(',').map(str::trim).filter(|v| !v.is_empty()) {
        match pool.insert(value) {
            Ok(()) => seeded += 1,
            Err(e) => tracing::warn!("Skipping seed token: {}", e),
        }
    }
    if seeded > 0 {
        info!("Seeded {} token(s) from environment", seeded);
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
