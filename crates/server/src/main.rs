//! pwa-proxy entry point.
//!
//! Boots the caching worker in front of the content server and serves it over
//! HTTP. Logs are JSON on stderr.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use pwacache_client::{FetchClient, FetchConfig};
use pwacache_core::{AppConfig, CacheDb};
use pwacache_worker::{Registration, WorkerConfig};
use tracing_subscriber::EnvFilter;

mod error;
mod handler;

/// Keep retrying the install while nothing controls requests.
async fn retry_install(registration: Arc<Registration>, config: WorkerConfig, every: Duration) {
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    ticker.tick().await;

    loop {
        ticker.tick().await;
        if registration.controller().await.is_some() {
            continue;
        }

        tracing::info!(version = %config.version, "retrying install");
        if let Err(e) = registration.register(config.clone()).await {
            tracing::warn!(error = %e, "install retry failed");
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
    tracing::info!("shutting down");
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load().context("loading configuration")?;
    let worker_config = WorkerConfig::from_app(&config)?;

    tracing::info!(
        origin = %config.origin,
        version = %config.version,
        db = %config.db_path.display(),
        "starting pwa-proxy"
    );

    let store = Arc::new(CacheDb::open(&config.db_path).await?);
    let network = Arc::new(FetchClient::new(FetchConfig::from(&config))?);
    let registration = Arc::new(Registration::new(store, network.clone()));

    if let Err(e) = registration.register(worker_config.clone()).await {
        tracing::warn!(error = %e, "initial install failed, forwarding requests uncached");
    }

    if let Some(every) = config.install_retry_interval() {
        tokio::spawn(retry_install(registration.clone(), worker_config.clone(), every));
    }

    let state = handler::AppState { registration, network, origin: worker_config.origin.clone() };
    let app = handler::router(state);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("binding {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, "listening");

    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

    Ok(())
}
