//! Core domain types used by the verifier.
//!
//! This module defines strongly-typed hashes and identifiers shared by the
//! certificate, sidechain and session code. As elsewhere in the crate, the
//! goal is to avoid "naked" byte buffers in public APIs and use
//! domain-specific newtypes instead.

use serde::{Deserialize, Serialize};

/// Withdrawal certificates and their outputs.
pub mod certificate;
/// Sidechain registration data and verification-key bytes.
pub mod sidechain;

pub use certificate::{BackwardTransfer, TxOut, WithdrawalCertificate};
pub use sidechain::{ScVk, SidechainInfo};

/// Length in bytes of all 256-bit hash types used in this module.
pub const HASH_LEN: usize = 32;

/// Length in bytes of a backward-transfer destination (public key hash).
pub const PUB_KEY_HASH_LEN: usize = 20;

/// Strongly-typed 256-bit hash wrapper (BLAKE3-256).
///
/// Backing representation for block hashes, sidechain identifiers and
/// certificate identifiers. Always exactly [`HASH_LEN`] bytes long.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Hash256(pub [u8; HASH_LEN]);

impl Hash256 {
    /// Computes a new [`Hash256`] as the BLAKE3-256 hash of `data`.
    pub fn compute(data: &[u8]) -> Self {
        let h = blake3::hash(data);
        Hash256(*h.as_bytes())
    }

    /// Returns the underlying 32-byte hash as a borrowed array.
    pub fn as_bytes(&self) -> &[u8; HASH_LEN] {
        &self.0
    }

    /// Parses a hash from a slice, returning `None` unless it is exactly
    /// [`HASH_LEN`] bytes long.
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        let arr: [u8; HASH_LEN] = bytes.try_into().ok()?;
        Some(Hash256(arr))
    }

    /// Lower-case hex encoding, as used in logs and file names.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

/// Hash of a mainchain block.
///
/// Certificates carry the hash of the block that closes their epoch; the
/// hash of the block closing the previous epoch is looked up in the
/// [`ActiveChain`](crate::chain::ActiveChain).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct BlockHash(pub Hash256);

impl BlockHash {
    pub fn as_bytes(&self) -> &[u8; HASH_LEN] {
        self.0.as_bytes()
    }
}

/// Identifier of a registered sidechain.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct SidechainId(pub Hash256);

impl SidechainId {
    /// Returns the underlying [`Hash256`] backing this identifier.
    pub fn as_hash(&self) -> &Hash256 {
        &self.0
    }
}

/// Destination of a backward transfer on the mainchain.
///
/// This is the 20-byte hash of the receiving public key, exactly as it is
/// handed to the verification engine.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct PubKeyHash(pub [u8; PUB_KEY_HASH_LEN]);

impl PubKeyHash {
    pub fn as_bytes(&self) -> &[u8; PUB_KEY_HASH_LEN] {
        &self.0
    }
}
