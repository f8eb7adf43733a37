use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

mod api;
mod cache;
mod challonge;
mod config;
mod error;
mod fan_out;
mod matches;
mod models;

use api::AppState;
use cache::TournamentCache;
use challonge::ChallongeClient;
use config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialise tracing / logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();
    config.validate()?;

    let client = ChallongeClient::new(
        &config.challonge_api_url,
        &config.api_key,
        config.request_timeout(),
    )?;
    info!(
        "Challonge client ready: {} (timeout {:?})",
        config.challonge_api_url,
        config.request_timeout()
    );

    let cache = TournamentCache::new(config.update_ttl(), config.clear_ttl());
    info!(
        "Tournament cache: refresh after {:?}, wipe every {:?}",
        config.update_ttl(),
        config.clear_ttl()
    );

    let app = api::router(AppState {
        cache,
        client: Arc::new(client),
    });
    let addr: SocketAddr = config
        .listen_addr
        .parse()
        .with_context(|| format!("Invalid LISTEN_ADDR {}", config.listen_addr))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
