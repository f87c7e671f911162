//! HTTP route handlers and their request/response DTOs.

pub mod certificates;
pub mod chain;
pub mod health;
pub mod sidechains;

use axum::http::StatusCode;

use cert_verifier::{HASH_LEN, Hash256};

/// Parses a 32-byte hex string into a `Hash256`.
pub(crate) fn hex_to_hash256(hex_str: &str) -> Result<Hash256, String> {
    let bytes = hex::decode(hex_str).map_err(|e| format!("invalid hex encoding: {e}"))?;
    Hash256::from_slice(&bytes).ok_or_else(|| {
        format!(
            "expected {HASH_LEN}-byte hash, got {} bytes",
            bytes.len()
        )
    })
}

/// Decodes an arbitrary-length hex string, naming `field` on failure.
pub(crate) fn decode_hex(field: &str, hex_str: &str) -> Result<Vec<u8>, String> {
    hex::decode(hex_str).map_err(|e| format!("invalid hex in {field}: {e}"))
}

pub(crate) fn as_bad_request(msg: String) -> (StatusCode, String) {
    (StatusCode::BAD_REQUEST, msg)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_to_hash256_checks_length() {
        let ok = hex_to_hash256(&"ab".repeat(HASH_LEN)).expect("valid hash");
        assert_eq!(ok, Hash256([0xAB; HASH_LEN]));

        assert!(hex_to_hash256("abcd").is_err());
        assert!(hex_to_hash256("zz").is_err());
    }
}
