use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;

use cert_verifier::ActiveChain;

use crate::state::SharedState;

/// Simple health-check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    /// Height of the active chain tip, if any block was fed.
    pub chain_height: Option<u64>,
    pub sidechains: usize,
}

/// `GET /health`
///
/// Returns a basic JSON document indicating liveness.
pub async fn health(State(state): State<SharedState>) -> (StatusCode, Json<HealthResponse>) {
    let chain_height = state.chain.read().await.height();
    let sidechains = state.sidechains.read().await.len();
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok",
            chain_height,
            sidechains,
        }),
    )
}
