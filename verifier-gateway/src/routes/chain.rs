use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

use cert_verifier::BlockHash;

use crate::routes::{as_bad_request, hex_to_hash256};
use crate::state::SharedState;

/// Request body for `POST /chain/blocks`.
#[derive(Debug, Deserialize)]
pub struct AppendBlockRequest {
    /// Hex-encoded 32-byte hash of the new tip.
    pub block_hash_hex: String,
}

/// Response body for `POST /chain/blocks`.
#[derive(Debug, Serialize)]
pub struct AppendBlockResponse {
    pub height: u64,
}

/// `POST /chain/blocks`
///
/// Connects a block on top of the active chain.
pub async fn append_block(
    State(state): State<SharedState>,
    Json(body): Json<AppendBlockRequest>,
) -> Result<(StatusCode, Json<AppendBlockResponse>), (StatusCode, String)> {
    let hash = BlockHash(hex_to_hash256(&body.block_hash_hex).map_err(as_bad_request)?);
    let height = state.chain.write().await.push(hash);

    tracing::debug!(height, hash = %body.block_hash_hex, "connected block");
    Ok((StatusCode::CREATED, Json(AppendBlockResponse { height })))
}
