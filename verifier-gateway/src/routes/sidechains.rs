use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

use cert_verifier::{ProofEngine, ScVk, SidechainId, SidechainInfo};

use crate::routes::{as_bad_request, decode_hex, hex_to_hash256};
use crate::state::SharedState;

/// Request body for `POST /sidechains/register`.
#[derive(Debug, Deserialize)]
pub struct RegisterSidechainRequest {
    /// Hex-encoded 32-byte sidechain identifier.
    pub sidechain_id_hex: String,
    /// Mainchain height at which the sidechain was created.
    pub creation_block_height: u64,
    /// Number of mainchain blocks per withdrawal epoch.
    pub withdrawal_epoch_length: u64,
    /// Hex-encoded constant field element; absent or empty when the
    /// circuit takes none.
    #[serde(default)]
    pub constant_hex: Option<String>,
    /// Hex-encoded withdrawal-certificate verification key.
    pub vk_hex: String,
}

/// Response body for `POST /sidechains/register`.
#[derive(Debug, Serialize)]
pub struct RegisterSidechainResponse {
    pub status: &'static str,
    pub sidechain_id: String,
    pub vk_path: String,
}

/// `POST /sidechains/register`
///
/// Stores the sidechain's verification key and records its parameters.
/// A sidechain can only be registered once.
pub async fn register_sidechain(
    State(state): State<SharedState>,
    Json(body): Json<RegisterSidechainRequest>,
) -> Result<(StatusCode, Json<RegisterSidechainResponse>), (StatusCode, String)> {
    let sidechain_id =
        SidechainId(hex_to_hash256(&body.sidechain_id_hex).map_err(as_bad_request)?);
    let vk = ScVk(decode_hex("vk_hex", &body.vk_hex).map_err(as_bad_request)?);
    let constant = match body.constant_hex.as_deref() {
        Some(c) => decode_hex("constant_hex", c).map_err(as_bad_request)?,
        None => Vec::new(),
    };

    if body.withdrawal_epoch_length == 0 {
        return Err(as_bad_request(
            "withdrawal_epoch_length must be positive".to_string(),
        ));
    }

    let engine = state.validator.engine();
    if engine.deserialize_vk(&vk).is_none() {
        return Err(as_bad_request("invalid verification key".to_string()));
    }
    if !constant.is_empty() && engine.deserialize_field(&constant).is_none() {
        return Err(as_bad_request("invalid constant".to_string()));
    }

    // Held across the write so that concurrent registrations of the same
    // id cannot both store a key.
    let mut sidechains = state.sidechains.write().await;
    if sidechains.contains_key(&sidechain_id) {
        return Err((
            StatusCode::CONFLICT,
            format!("sidechain {} already registered", body.sidechain_id_hex),
        ));
    }

    let store = state.vk_store.clone();
    let vk_path = tokio::task::spawn_blocking(move || store.save(&sidechain_id, &vk))
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("join error: {e}")))?
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    let info = SidechainInfo {
        sidechain_id,
        creation_block_height: body.creation_block_height,
        withdrawal_epoch_length: body.withdrawal_epoch_length,
        constant,
        w_cert_vk_path: vk_path.clone(),
    };
    sidechains.insert(sidechain_id, info);

    tracing::info!(
        sidechain = %sidechain_id.as_hash().to_hex(),
        creation_height = body.creation_block_height,
        epoch_length = body.withdrawal_epoch_length,
        "registered sidechain"
    );

    Ok((
        StatusCode::CREATED,
        Json(RegisterSidechainResponse {
            status: "registered",
            sidechain_id: sidechain_id.as_hash().to_hex(),
            vk_path: vk_path.display().to_string(),
        }),
    ))
}
