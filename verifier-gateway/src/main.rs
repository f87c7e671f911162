// verifier-gateway/src/main.rs

//! Verifier gateway binary.
//!
//! This binary exposes a small HTTP API on top of the `cert_verifier`
//! crate:
//!
//! - `GET /health`
//! - `POST /sidechains/register`
//! - `POST /chain/blocks`
//! - `POST /certificates/verify`
//!
//! It keeps the active chain and the registered sidechains in memory,
//! stores verification keys on disk, and runs a Prometheus metrics
//! exporter on `/metrics`.

mod config;
mod routes;
mod state;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tokio::signal;
use tracing_subscriber::EnvFilter;

use cert_verifier::{MetricsRegistry, run_prometheus_http_server};
use config::ApiConfig;
use routes::{certificates, chain, health, sidechains};
use state::{AppState, SharedState};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("verifier_gateway=info,cert_verifier=info")),
        )
        .init();

    if let Err(e) = run().await {
        tracing::error!("fatal error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), String> {
    let api_cfg = ApiConfig::from_env()?;
    let verifier_cfg = &api_cfg.verifier;

    // ---------------------------
    // Metrics
    // ---------------------------

    let metrics = Arc::new(
        MetricsRegistry::new()
            .map_err(|e| format!("failed to initialise metrics registry: {e}"))?,
    );

    if verifier_cfg.metrics.enabled {
        let metrics_clone = metrics.clone();
        let addr = verifier_cfg.metrics.listen_addr;
        tokio::spawn(async move {
            if let Err(e) = run_prometheus_http_server(metrics_clone, addr).await {
                tracing::error!("metrics HTTP server error: {e}");
            }
        });
        tracing::info!("metrics exporter listening on http://{}/metrics", addr);
    }

    // ---------------------------
    // Verification-key store + shared state
    // ---------------------------

    std::fs::create_dir_all(&verifier_cfg.vk_dir).map_err(|e| {
        format!(
            "failed to create key directory {}: {e}",
            verifier_cfg.vk_dir.display()
        )
    })?;
    tracing::info!(vk_dir = %verifier_cfg.vk_dir.display(), "verification-key store ready");

    let app_state: SharedState = Arc::new(AppState::new(
        verifier_cfg.vk_store(),
        verifier_cfg.proof_engine(),
        metrics,
    ));

    // ---------------------------
    // HTTP router
    // ---------------------------

    let app = Router::new()
        .route("/health", get(health::health))
        .route("/sidechains/register", post(sidechains::register_sidechain))
        .route("/chain/blocks", post(chain::append_block))
        .route("/certificates/verify", post(certificates::verify_certificate))
        .with_state(app_state);

    tracing::info!("verifier gateway listening on http://{}", api_cfg.listen_addr);

    let listener = tokio::net::TcpListener::bind(api_cfg.listen_addr)
        .await
        .map_err(|e| format!("failed to bind {}: {e}", api_cfg.listen_addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| format!("API server error: {e}"))?;

    Ok(())
}

/// Waits for Ctrl-C and returns, used for graceful shutdown.
async fn shutdown_signal() {
    let _ = signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
