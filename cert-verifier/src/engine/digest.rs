//! Keyed-BLAKE3 reference engine.
//!
//! [`DigestEngine`] implements the [`ProofEngine`] contract with a
//! designated-verifier MAC instead of a SNARK: a "proof" is a keyed
//! BLAKE3 tag over the canonical encoding of the public inputs, under a
//! key derived from the verification key. It is **not** zero-knowledge
//! and anyone holding the verification key can forge proofs; it exists so
//! that the parameter lifecycle can be exercised end to end (tests, the
//! gateway, local devnets) without a native proving library.
//!
//! Wire formats:
//!
//! - field element: 32 bytes, little-endian, canonical iff the top byte
//!   is below `0x40` (i.e. the value is below 2^254);
//! - proof: `tag (32) || commitment (32)`, where the commitment is a
//!   canonical field element derived from the tag. Reading a proof only
//!   checks its size and that the commitment is canonical; whether tag and
//!   commitment match the statement is decided by `verify`;
//! - verification key: `flags (1) || key material (>= 32)`, where flag
//!   bit 0 marks circuits that take a constant.

use serde::Serialize;

use crate::types::{BackwardTransfer, BlockHash, HASH_LEN, ScVk};

use super::{EngineError, ProofEngine, ProofInputs};

/// Serialized size of a field element.
pub const FIELD_SIZE: usize = 32;

/// Serialized size of a proof.
pub const PROOF_SIZE: usize = 64;

/// Default upper bound on backward transfers per certificate.
pub const MAX_BACKWARD_TRANSFERS: usize = 4096;

const FIELD_TOP_BYTE_BOUND: u8 = 0x40;
const VK_FLAG_HAS_CONSTANT: u8 = 0b0000_0001;
const VK_MIN_KEY_MATERIAL: usize = 32;

const MAC_KEY_CONTEXT: &str = "cert-verifier digest-engine v1 wcert mac key";
const VK_SEED_CONTEXT: &str = "cert-verifier digest-engine v1 vk from seed";

/// Field element handle.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DigestField([u8; FIELD_SIZE]);

/// Proof handle.
#[derive(Clone, Debug)]
pub struct DigestProof {
    tag: [u8; HASH_LEN],
    commitment: [u8; FIELD_SIZE],
}

/// Verification-key handle.
#[derive(Clone, Debug)]
pub struct DigestVk {
    expects_constant: bool,
    mac_key: [u8; HASH_LEN],
}

impl DigestVk {
    /// Whether the circuit behind this key takes a constant.
    pub fn expects_constant(&self) -> bool {
        self.expects_constant
    }
}

/// Public inputs of a certificate proof, in owned form.
///
/// Used by tooling to produce proofs with [`DigestEngine::prove`].
#[derive(Clone, Debug)]
pub struct ProofStatement {
    pub end_epoch_mc_b_hash: BlockHash,
    pub prev_end_epoch_mc_b_hash: BlockHash,
    pub bt_list: Vec<BackwardTransfer>,
    pub quality: u64,
    /// Serialized constant; empty when the circuit has none.
    pub constant: Vec<u8>,
}

/// Canonical encoding of the public inputs; the MAC is computed over its
/// bincode-2 bytes.
#[derive(Serialize)]
struct Statement<'a> {
    end_epoch_mc_b_hash: &'a [u8; HASH_LEN],
    prev_end_epoch_mc_b_hash: &'a [u8; HASH_LEN],
    bt_list: &'a [BackwardTransfer],
    quality: u64,
    constant: Option<&'a [u8; FIELD_SIZE]>,
    proofdata: Option<&'a [u8; FIELD_SIZE]>,
}

impl Statement<'_> {
    fn tag(&self, vk: &DigestVk) -> Result<blake3::Hash, EngineError> {
        let cfg = bincode::config::standard();
        let bytes = bincode::serde::encode_to_vec(self, cfg)
            .map_err(|e| EngineError::Crypto(format!("failed to encode statement: {e}")))?;
        Ok(blake3::keyed_hash(&vk.mac_key, &bytes))
    }
}

/// Reference engine; see the module documentation.
#[derive(Clone, Debug)]
pub struct DigestEngine {
    max_backward_transfers: usize,
}

impl Default for DigestEngine {
    fn default() -> Self {
        Self {
            max_backward_transfers: MAX_BACKWARD_TRANSFERS,
        }
    }
}

impl DigestEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine accepting at most `max` backward transfers per certificate.
    pub fn with_max_backward_transfers(max: usize) -> Self {
        Self {
            max_backward_transfers: max,
        }
    }

    /// Deterministically derives a verification key from `seed`.
    pub fn generate_vk(seed: &[u8], with_constant: bool) -> ScVk {
        let flags = if with_constant { VK_FLAG_HAS_CONSTANT } else { 0 };
        let material = blake3::derive_key(VK_SEED_CONTEXT, seed);

        let mut bytes = Vec::with_capacity(1 + material.len());
        bytes.push(flags);
        bytes.extend_from_slice(&material);
        ScVk(bytes)
    }

    /// Deterministically derives a canonical field element from `seed`.
    pub fn field_from_seed(seed: &[u8]) -> Vec<u8> {
        canonical_field(seed).to_vec()
    }

    /// Produces a proof for `statement` under `vk`.
    ///
    /// Returns `None` if the key or the constant do not deserialize, or if
    /// the statement cannot be encoded.
    pub fn prove(&self, vk: &ScVk, statement: &ProofStatement) -> Option<Vec<u8>> {
        let vk = self.deserialize_vk(vk)?;
        let constant = if statement.constant.is_empty() {
            None
        } else {
            Some(self.deserialize_field(&statement.constant)?)
        };

        let tag = Statement {
            end_epoch_mc_b_hash: statement.end_epoch_mc_b_hash.as_bytes(),
            prev_end_epoch_mc_b_hash: statement.prev_end_epoch_mc_b_hash.as_bytes(),
            bt_list: &statement.bt_list,
            quality: statement.quality,
            constant: constant.as_ref().map(|c| &c.0),
            proofdata: None,
        }
        .tag(&vk)
        .ok()?;

        let mut proof = Vec::with_capacity(PROOF_SIZE);
        proof.extend_from_slice(tag.as_bytes());
        proof.extend_from_slice(&canonical_field(tag.as_bytes()));
        Some(proof)
    }
}

/// BLAKE3 of `seed`, reduced below 2^254.
fn canonical_field(seed: &[u8]) -> [u8; FIELD_SIZE] {
    let mut bytes = *blake3::hash(seed).as_bytes();
    bytes[FIELD_SIZE - 1] &= FIELD_TOP_BYTE_BOUND - 1;
    bytes
}

impl ProofEngine for DigestEngine {
    type Field = DigestField;
    type Proof = DigestProof;
    type VerifyingKey = DigestVk;

    fn field_size(&self) -> usize {
        FIELD_SIZE
    }

    fn proof_size(&self) -> usize {
        PROOF_SIZE
    }

    fn deserialize_field(&self, bytes: &[u8]) -> Option<DigestField> {
        let arr: [u8; FIELD_SIZE] = bytes.try_into().ok()?;
        if arr[FIELD_SIZE - 1] >= FIELD_TOP_BYTE_BOUND {
            return None;
        }
        Some(DigestField(arr))
    }

    fn deserialize_proof(&self, bytes: &[u8]) -> Option<DigestProof> {
        if bytes.len() != PROOF_SIZE {
            return None;
        }
        let (tag, commitment) = bytes.split_at(HASH_LEN);
        let tag: [u8; HASH_LEN] = tag.try_into().ok()?;
        let commitment = self.deserialize_field(commitment)?.0;
        Some(DigestProof { tag, commitment })
    }

    fn deserialize_vk(&self, vk: &ScVk) -> Option<DigestVk> {
        let (&flags, material) = vk.as_bytes().split_first()?;
        if flags & !VK_FLAG_HAS_CONSTANT != 0 || material.len() < VK_MIN_KEY_MATERIAL {
            return None;
        }
        Some(DigestVk {
            expects_constant: flags & VK_FLAG_HAS_CONSTANT != 0,
            mac_key: blake3::derive_key(MAC_KEY_CONTEXT, material),
        })
    }

    fn verify(&self, inputs: &ProofInputs<'_, Self>) -> Result<bool, EngineError> {
        let supplied = inputs.constant.is_some();
        if inputs.sc_vk.expects_constant != supplied {
            return Err(EngineError::ConstantMismatch {
                expected: inputs.sc_vk.expects_constant,
                supplied,
            });
        }

        if inputs.bt_list.len() > self.max_backward_transfers {
            return Err(EngineError::TooManyBackwardTransfers {
                count: inputs.bt_list.len(),
                max: self.max_backward_transfers,
            });
        }

        let expected = Statement {
            end_epoch_mc_b_hash: inputs.end_epoch_mc_b_hash.as_bytes(),
            prev_end_epoch_mc_b_hash: inputs.prev_end_epoch_mc_b_hash.as_bytes(),
            bt_list: inputs.bt_list,
            quality: inputs.quality,
            constant: inputs.constant.map(|c| &c.0),
            proofdata: inputs.proofdata.map(|p| &p.0),
        }
        .tag(inputs.sc_vk)?;

        // `blake3::Hash` equality is constant time.
        let tag_ok = expected == blake3::Hash::from(inputs.sc_proof.tag);
        let commitment_ok = blake3::Hash::from(canonical_field(expected.as_bytes()))
            == blake3::Hash::from(inputs.sc_proof.commitment);
        Ok(tag_ok & commitment_ok)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Hash256, PUB_KEY_HASH_LEN};

    fn statement(constant: Vec<u8>) -> ProofStatement {
        ProofStatement {
            end_epoch_mc_b_hash: BlockHash(Hash256([1u8; HASH_LEN])),
            prev_end_epoch_mc_b_hash: BlockHash(Hash256([2u8; HASH_LEN])),
            bt_list: vec![BackwardTransfer {
                pk_dest: [3u8; PUB_KEY_HASH_LEN],
                amount: 50,
            }],
            quality: 4,
            constant,
        }
    }

    fn check(
        engine: &DigestEngine,
        vk: &ScVk,
        st: &ProofStatement,
        proof: &[u8],
    ) -> Result<bool, EngineError> {
        let vk = engine.deserialize_vk(vk).expect("vk deserializes");
        let proof = engine.deserialize_proof(proof).expect("proof deserializes");
        let constant = if st.constant.is_empty() {
            None
        } else {
            Some(engine.deserialize_field(&st.constant).expect("constant deserializes"))
        };

        engine.verify(&ProofInputs {
            end_epoch_mc_b_hash: &st.end_epoch_mc_b_hash,
            prev_end_epoch_mc_b_hash: &st.prev_end_epoch_mc_b_hash,
            bt_list: &st.bt_list,
            quality: st.quality,
            constant: constant.as_ref(),
            proofdata: None,
            sc_proof: &proof,
            sc_vk: &vk,
        })
    }

    #[test]
    fn honest_proof_verifies() {
        let engine = DigestEngine::new();
        let vk = DigestEngine::generate_vk(b"sc-1", false);
        let st = statement(Vec::new());
        let proof = engine.prove(&vk, &st).expect("prove");

        assert_eq!(proof.len(), PROOF_SIZE);
        assert_eq!(check(&engine, &vk, &st, &proof), Ok(true));
    }

    #[test]
    fn proof_for_other_statement_does_not_verify() {
        let engine = DigestEngine::new();
        let vk = DigestEngine::generate_vk(b"sc-1", false);
        let proof = engine.prove(&vk, &statement(Vec::new())).expect("prove");

        let mut other = statement(Vec::new());
        other.quality += 1;
        assert_eq!(check(&engine, &vk, &other, &proof), Ok(false));
    }

    #[test]
    fn proof_under_other_key_does_not_verify() {
        let engine = DigestEngine::new();
        let vk = DigestEngine::generate_vk(b"sc-1", false);
        let other_vk = DigestEngine::generate_vk(b"sc-2", false);
        let st = statement(Vec::new());
        let proof = engine.prove(&other_vk, &st).expect("prove");

        assert_eq!(check(&engine, &vk, &st, &proof), Ok(false));
    }

    #[test]
    fn constant_is_bound_into_the_proof() {
        let engine = DigestEngine::new();
        let vk = DigestEngine::generate_vk(b"sc-c", true);
        let st = statement(DigestEngine::field_from_seed(b"c1"));
        let proof = engine.prove(&vk, &st).expect("prove");

        assert_eq!(check(&engine, &vk, &st, &proof), Ok(true));

        let other = statement(DigestEngine::field_from_seed(b"c2"));
        assert_eq!(check(&engine, &vk, &other, &proof), Ok(false));
    }

    #[test]
    fn constant_presence_mismatch_is_an_engine_error() {
        let engine = DigestEngine::new();
        let with_constant = DigestEngine::generate_vk(b"sc-c", true);
        let without = DigestEngine::generate_vk(b"sc-c", false);
        let st = statement(Vec::new());
        let proof = engine.prove(&without, &st).expect("prove");

        let err = check(&engine, &with_constant, &st, &proof).unwrap_err();
        assert_eq!(
            err,
            EngineError::ConstantMismatch {
                expected: true,
                supplied: false
            }
        );
    }

    #[test]
    fn too_many_backward_transfers_is_an_engine_error() {
        let engine = DigestEngine::with_max_backward_transfers(0);
        let vk = DigestEngine::generate_vk(b"sc-1", false);
        let st = statement(Vec::new());
        let proof = DigestEngine::new().prove(&vk, &st).expect("prove");

        match check(&engine, &vk, &st, &proof) {
            Err(EngineError::TooManyBackwardTransfers { count: 1, max: 0 }) => {}
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn non_canonical_field_is_rejected() {
        let engine = DigestEngine::new();
        let mut bytes = DigestEngine::field_from_seed(b"x");
        assert!(engine.deserialize_field(&bytes).is_some());

        bytes[FIELD_SIZE - 1] = 0xFF;
        assert!(engine.deserialize_field(&bytes).is_none());
        assert!(engine.deserialize_field(&bytes[..FIELD_SIZE - 1]).is_none());
    }

    #[test]
    fn proof_with_non_canonical_commitment_is_rejected() {
        let engine = DigestEngine::new();
        let vk = DigestEngine::generate_vk(b"sc-1", false);
        let mut proof = engine.prove(&vk, &statement(Vec::new())).expect("prove");

        proof[PROOF_SIZE - 1] = 0xFF;
        assert!(engine.deserialize_proof(&proof).is_none());
        assert!(engine.deserialize_proof(&proof[..PROOF_SIZE - 1]).is_none());
    }

    #[test]
    fn corrupted_proof_reads_but_does_not_verify() {
        let engine = DigestEngine::new();
        let vk = DigestEngine::generate_vk(b"sc-1", false);
        let st = statement(Vec::new());
        let proof = engine.prove(&vk, &st).expect("prove");

        for idx in [0, 5, HASH_LEN - 1, HASH_LEN, PROOF_SIZE - 1] {
            let mut corrupted = proof.clone();
            corrupted[idx] ^= 0x01;
            assert!(
                engine.deserialize_proof(&corrupted).is_some(),
                "byte {idx} should still read"
            );
            assert_eq!(check(&engine, &vk, &st, &corrupted), Ok(false), "byte {idx}");
        }
    }

    #[test]
    fn malformed_vk_is_rejected() {
        let engine = DigestEngine::new();
        assert!(engine.deserialize_vk(&ScVk(Vec::new())).is_none());
        assert!(engine.deserialize_vk(&ScVk(vec![0u8; 8])).is_none());

        let mut unknown_flag = DigestEngine::generate_vk(b"sc-1", false);
        unknown_flag.0[0] = 0x80;
        assert!(engine.deserialize_vk(&unknown_flag).is_none());
    }
}
