// cert-verifier/src/types/certificate.rs

//! Withdrawal certificate types.
//!
//! A withdrawal certificate closes one epoch of a sidechain: it commits to
//! the mainchain block ending the epoch, carries a quality score and a
//! SNARK proof, and lists the outputs paying funds back to the mainchain.

use serde::{Deserialize, Serialize};

use super::{BlockHash, PubKeyHash, SidechainId};

/// One output of a withdrawal certificate.
///
/// Only outputs flagged with `is_from_backward_transfer` are payouts from
/// the sidechain; the remaining ones (e.g. change) are ignored by proof
/// verification.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TxOut {
    /// Amount paid by this output.
    pub value: u64,

    /// Hash of the receiving public key.
    pub pub_key_hash: PubKeyHash,

    /// Whether this output is a backward transfer.
    pub is_from_backward_transfer: bool,
}

impl TxOut {
    /// Creates a backward-transfer output.
    pub fn backward_transfer(pub_key_hash: PubKeyHash, value: u64) -> Self {
        Self {
            value,
            pub_key_hash,
            is_from_backward_transfer: true,
        }
    }

    /// Creates an ordinary (change) output.
    pub fn change(pub_key_hash: PubKeyHash, value: u64) -> Self {
        Self {
            value,
            pub_key_hash,
            is_from_backward_transfer: false,
        }
    }
}

/// A single payout instruction as consumed by the verification engine.
///
/// The layout is flat on purpose: the engine receives a slice of these
/// and its length.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct BackwardTransfer {
    /// 20-byte destination identifier.
    pub pk_dest: [u8; super::PUB_KEY_HASH_LEN],
    /// Amount paid to `pk_dest`.
    pub amount: u64,
}

/// Sidechain withdrawal certificate.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WithdrawalCertificate {
    /// Sidechain this certificate belongs to.
    pub sidechain_id: SidechainId,

    /// Epoch closed by this certificate, counted from sidechain creation.
    pub epoch_number: u32,

    /// Ranking among competing certificates for the same epoch.
    pub quality: u64,

    /// Hash of the mainchain block ending the epoch.
    pub end_epoch_block_hash: BlockHash,

    /// Serialized SNARK proof.
    pub sc_proof: Vec<u8>,

    /// Certificate outputs, in their on-chain order.
    pub outputs: Vec<TxOut>,
}

impl WithdrawalCertificate {
    /// Extracts the backward-transfer list, preserving output order.
    pub fn backward_transfers(&self) -> Vec<BackwardTransfer> {
        self.outputs
            .iter()
            .filter(|out| out.is_from_backward_transfer)
            .map(|out| BackwardTransfer {
                pk_dest: out.pub_key_hash.0,
                amount: out.value,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{HASH_LEN, Hash256, PUB_KEY_HASH_LEN};

    fn pkh(byte: u8) -> PubKeyHash {
        PubKeyHash([byte; PUB_KEY_HASH_LEN])
    }

    fn dummy_cert(outputs: Vec<TxOut>) -> WithdrawalCertificate {
        WithdrawalCertificate {
            sidechain_id: SidechainId(Hash256([9u8; HASH_LEN])),
            epoch_number: 3,
            quality: 17,
            end_epoch_block_hash: BlockHash(Hash256([1u8; HASH_LEN])),
            sc_proof: vec![0u8; 8],
            outputs,
        }
    }

    #[test]
    fn backward_transfers_skip_change_and_keep_order() {
        let cert = dummy_cert(vec![
            TxOut::change(pkh(1), 5),
            TxOut::backward_transfer(pkh(2), 100),
            TxOut::change(pkh(3), 7),
            TxOut::backward_transfer(pkh(4), 200),
            TxOut::backward_transfer(pkh(5), 300),
        ]);

        let bts = cert.backward_transfers();

        assert_eq!(bts.len(), 3);
        assert_eq!(bts[0].pk_dest, [2u8; PUB_KEY_HASH_LEN]);
        assert_eq!(bts[0].amount, 100);
        assert_eq!(bts[1].pk_dest, [4u8; PUB_KEY_HASH_LEN]);
        assert_eq!(bts[1].amount, 200);
        assert_eq!(bts[2].pk_dest, [5u8; PUB_KEY_HASH_LEN]);
        assert_eq!(bts[2].amount, 300);
    }

    #[test]
    fn certificate_without_backward_transfers_yields_empty_list() {
        let cert = dummy_cert(vec![TxOut::change(pkh(1), 5)]);
        assert!(cert.backward_transfers().is_empty());
    }
}
