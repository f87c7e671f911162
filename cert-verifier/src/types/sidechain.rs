//! Sidechain registration data.
//!
//! A [`SidechainInfo`] is what the mainchain remembers about a sidechain
//! once it has been created: where its epochs start, the optional circuit
//! constant, and where its withdrawal-certificate verification key lives.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::SidechainId;

/// Raw verification-key bytes.
///
/// Opaque to everything except the verification engine; the only valid
/// operation is handing the whole buffer to its deserializer.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct ScVk(pub Vec<u8>);

impl ScVk {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Registration data of a sidechain.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SidechainInfo {
    /// Identifier of the sidechain.
    pub sidechain_id: SidechainId,

    /// Mainchain height at which the sidechain was created.
    pub creation_block_height: u64,

    /// Number of mainchain blocks per withdrawal epoch.
    pub withdrawal_epoch_length: u64,

    /// Serialized circuit constant. Empty when the circuit has none.
    pub constant: Vec<u8>,

    /// File holding the withdrawal-certificate verification key.
    pub w_cert_vk_path: PathBuf,
}

impl SidechainInfo {
    /// Mainchain height of the first block of `epoch`.
    ///
    /// Saturates instead of overflowing; a saturated height is never
    /// present in the active chain, so lookups fail cleanly.
    pub fn start_height_for_epoch(&self, epoch: u32) -> u64 {
        u64::from(epoch)
            .saturating_mul(self.withdrawal_epoch_length)
            .saturating_add(self.creation_block_height)
    }
}
