use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

use cert_verifier::{
    BlockHash, CertificateValidator, PUB_KEY_HASH_LEN, PubKeyHash, SidechainId, TxOut,
    WithdrawalCertificate,
};

use crate::routes::{as_bad_request, decode_hex, hex_to_hash256};
use crate::state::SharedState;

/// DTO version of [`TxOut`] used in the API.
#[derive(Debug, Deserialize)]
pub struct TxOutDto {
    pub value: u64,
    /// Hex-encoded 20-byte public key hash.
    pub pub_key_hash_hex: String,
    #[serde(default)]
    pub is_from_backward_transfer: bool,
}

impl TryFrom<TxOutDto> for TxOut {
    type Error = String;

    fn try_from(dto: TxOutDto) -> Result<Self, Self::Error> {
        let bytes = decode_hex("pub_key_hash_hex", &dto.pub_key_hash_hex)?;
        let pkh: [u8; PUB_KEY_HASH_LEN] = bytes.as_slice().try_into().map_err(|_| {
            format!(
                "expected {PUB_KEY_HASH_LEN}-byte public key hash, got {} bytes",
                bytes.len()
            )
        })?;
        Ok(TxOut {
            value: dto.value,
            pub_key_hash: PubKeyHash(pkh),
            is_from_backward_transfer: dto.is_from_backward_transfer,
        })
    }
}

/// Request body for `POST /certificates/verify`.
#[derive(Debug, Deserialize)]
pub struct VerifyCertificateRequest {
    pub sidechain_id_hex: String,
    pub epoch_number: u32,
    pub quality: u64,
    pub end_epoch_block_hash_hex: String,
    pub sc_proof_hex: String,
    #[serde(default)]
    pub outputs: Vec<TxOutDto>,
}

impl TryFrom<VerifyCertificateRequest> for WithdrawalCertificate {
    type Error = String;

    fn try_from(req: VerifyCertificateRequest) -> Result<Self, Self::Error> {
        Ok(WithdrawalCertificate {
            sidechain_id: SidechainId(hex_to_hash256(&req.sidechain_id_hex)?),
            epoch_number: req.epoch_number,
            quality: req.quality,
            end_epoch_block_hash: BlockHash(hex_to_hash256(&req.end_epoch_block_hash_hex)?),
            sc_proof: decode_hex("sc_proof_hex", &req.sc_proof_hex)?,
            outputs: req
                .outputs
                .into_iter()
                .map(TxOut::try_from)
                .collect::<Result<_, _>>()?,
        })
    }
}

/// Response body for `POST /certificates/verify`.
#[derive(Debug, Serialize)]
pub struct VerifyCertificateResponse {
    pub verified: bool,
    /// Why the certificate was rejected; absent when verified.
    pub reason: Option<String>,
}

/// `POST /certificates/verify`
///
/// Verifies the certificate's proof against the registered sidechain and
/// the current active chain. A rejected certificate is still a successful
/// request; the outcome is in the response body.
pub async fn verify_certificate(
    State(state): State<SharedState>,
    Json(body): Json<VerifyCertificateRequest>,
) -> Result<(StatusCode, Json<VerifyCertificateResponse>), (StatusCode, String)> {
    let cert = WithdrawalCertificate::try_from(body).map_err(as_bad_request)?;

    let sc_info = state
        .sidechains
        .read()
        .await
        .get(&cert.sidechain_id)
        .cloned()
        .ok_or_else(|| {
            (
                StatusCode::NOT_FOUND,
                format!(
                    "sidechain {} not registered",
                    cert.sidechain_id.as_hash().to_hex()
                ),
            )
        })?;

    // Verification reads the key file and runs the engine; keep it off the
    // async workers.
    let worker_state = state.clone();
    let outcome = tokio::task::spawn_blocking(move || {
        let chain = worker_state.chain.blocking_read();
        worker_state.validator.validate(&cert, &sc_info, &*chain)
    })
    .await
    .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("join error: {e}")))?;

    let resp = match outcome {
        Ok(()) => VerifyCertificateResponse {
            verified: true,
            reason: None,
        },
        Err(e) => VerifyCertificateResponse {
            verified: false,
            reason: Some(e.to_string()),
        },
    };
    Ok((StatusCode::OK, Json(resp)))
}
