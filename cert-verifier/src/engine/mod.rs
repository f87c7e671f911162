//! Seam to the external proof-verification engine.
//!
//! The engine owns the proof system: field arithmetic, proof and key
//! formats, and the verification predicate itself. This crate only
//! assembles the inputs the engine expects and hands them over by
//! reference.
//!
//! Engine handles ([`ProofEngine::Field`], [`ProofEngine::Proof`],
//! [`ProofEngine::VerifyingKey`]) are owned values. Engines backed by
//! native libraries release the underlying resource in the handle's
//! `Drop`, so dropping a handle is the type-specific release call and
//! ownership guarantees it happens exactly once.

pub mod digest;

pub use digest::DigestEngine;

use std::fmt;

use crate::types::{BackwardTransfer, BlockHash, ScVk};

/// Error reported by the engine when verification could not be carried
/// out, as opposed to a proof that simply does not verify.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum EngineError {
    /// A constant was supplied to a circuit without one, or vice versa.
    ConstantMismatch { expected: bool, supplied: bool },
    /// More backward transfers than the circuit can take.
    TooManyBackwardTransfers { count: usize, max: usize },
    /// Any other internal failure of the engine.
    Crypto(String),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::ConstantMismatch { expected, supplied } => write!(
                f,
                "constant mismatch: circuit expects constant={expected}, supplied={supplied}"
            ),
            EngineError::TooManyBackwardTransfers { count, max } => {
                write!(f, "{count} backward transfers exceed circuit maximum of {max}")
            }
            EngineError::Crypto(msg) => write!(f, "proof engine error: {msg}"),
        }
    }
}

impl std::error::Error for EngineError {}

/// Complete parameter set of one verification call.
///
/// Everything is borrowed from the session that assembled it; the engine
/// must not retain any of it past the call.
pub struct ProofInputs<'a, E: ProofEngine + ?Sized> {
    pub end_epoch_mc_b_hash: &'a BlockHash,
    pub prev_end_epoch_mc_b_hash: &'a BlockHash,
    pub bt_list: &'a [BackwardTransfer],
    pub quality: u64,
    pub constant: Option<&'a E::Field>,
    pub proofdata: Option<&'a E::Field>,
    pub sc_proof: &'a E::Proof,
    pub sc_vk: &'a E::VerifyingKey,
}

/// Abstract proof-verification engine.
///
/// Implementations are shared between sessions running on different
/// threads, hence the `Send + Sync` bound.
pub trait ProofEngine: Send + Sync {
    /// Deserialized field element.
    type Field;
    /// Deserialized SNARK proof.
    type Proof;
    /// Deserialized verification key.
    type VerifyingKey;

    /// Canonical serialized size of one field element, in bytes.
    fn field_size(&self) -> usize;

    /// Serialized size of a proof, in bytes.
    fn proof_size(&self) -> usize;

    /// Deserializes a field element. `bytes` has length [`Self::field_size`].
    fn deserialize_field(&self, bytes: &[u8]) -> Option<Self::Field>;

    /// Deserializes a proof. `bytes` has length [`Self::proof_size`].
    fn deserialize_proof(&self, bytes: &[u8]) -> Option<Self::Proof>;

    /// Deserializes a verification key loaded from disk.
    fn deserialize_vk(&self, vk: &ScVk) -> Option<Self::VerifyingKey>;

    /// Runs the verification predicate.
    ///
    /// `Ok(false)` means the proof does not verify; `Err` means the engine
    /// failed to evaluate the predicate at all.
    fn verify(&self, inputs: &ProofInputs<'_, Self>) -> Result<bool, EngineError>;

    /// Resets any per-thread error state kept by the engine.
    ///
    /// Engines that report errors only through [`Self::verify`] keep the
    /// default no-op.
    fn clear_error(&self) {}
}
