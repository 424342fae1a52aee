mod api;
mod catalog;
mod config;
mod constants;
mod decode;
mod error;
mod geojson;
mod http_client;
mod provider;
mod risk;
mod types;
mod utils;

use std::sync::Arc;

use anyhow::{Context, Result};
use reqwest::Client;
use tracing::info;

use crate::api::router;
use crate::config::Config;
use crate::provider::ThreddsProvider;
use crate::types::AppState;
use crate::utils::init_tracing;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cfg = Config::from_env()?;

    let http = Client::builder()
        .timeout(cfg.request_timeout)
        .user_agent("severe-risk-api/1.0")
        .build()
        .context("Failed to build reqwest client")?;

    let provider = ThreddsProvider::new(
        http,
        cfg.catalog_url.clone(),
        cfg.dataset_marker.clone(),
        cfg.request_timeout,
    );
    let state = AppState {
        provider: Arc::new(provider),
    };

    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&cfg.listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", cfg.listen_addr))?;

    info!(
        "Severe risk API listening on {} (catalog {}, dataset marker {:?})",
        cfg.listen_addr, cfg.catalog_url, cfg.dataset_marker
    );
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
            sigterm.recv().await;
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
