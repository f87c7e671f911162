//! Certificate proof verification session.
//!
//! A [`CertProofVerificationSession`] verifies the SNARK proof of one
//! withdrawal certificate. It is single use and moves through
//!
//! ```text
//! Empty --create_parameters--> Prepared --verifier_call--> Verified | VerificationFailed
//!   \                                                              |
//!    `------------------------ free_parameters --------------------+--> Released
//! ```
//!
//! `create_parameters` turns the untrusted byte buffers of the certificate
//! and the sidechain registration into engine handles. Handles are built
//! into locals and only committed once every step succeeded, so an early
//! return drops (and thereby releases) whatever was already allocated.
//! `free_parameters` releases the committed handles; it is idempotent and
//! also runs when the session is dropped.

mod error;

pub use error::SessionError;

use crate::chain::ActiveChain;
use crate::engine::{EngineError, ProofEngine, ProofInputs};
use crate::store;
use crate::types::{BackwardTransfer, BlockHash, SidechainInfo, WithdrawalCertificate};

/// Lifecycle state of a session.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SessionState {
    Empty,
    Prepared,
    Verified,
    VerificationFailed,
    Released,
}

/// Outcome of [`CertProofVerificationSession::verifier_call`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Verdict {
    /// The proof verifies.
    Verified,
    /// The proof does not verify.
    NotVerified,
    /// The engine could not evaluate the proof. Callers treat this like
    /// [`Verdict::NotVerified`].
    EngineFailure(EngineError),
}

impl Verdict {
    pub fn is_verified(&self) -> bool {
        matches!(self, Verdict::Verified)
    }
}

/// Everything `create_parameters` assembles before committing it.
struct Assembled<E: ProofEngine> {
    constant: Option<E::Field>,
    quality: u64,
    proofdata: Option<E::Field>,
    sc_proof: E::Proof,
    sc_vk: E::VerifyingKey,
    end_epoch_mc_b_hash: BlockHash,
    prev_end_epoch_mc_b_hash: BlockHash,
    bt_list: Vec<BackwardTransfer>,
}

/// Parameters of one certificate proof verification.
pub struct CertProofVerificationSession<'a, E: ProofEngine, C: ActiveChain + ?Sized> {
    engine: &'a E,
    chain: &'a C,
    cert: &'a WithdrawalCertificate,
    sc_info: &'a SidechainInfo,
    state: SessionState,

    constant: Option<E::Field>,
    quality: u64,
    proofdata: Option<E::Field>,
    sc_proof: Option<E::Proof>,
    sc_vk: Option<E::VerifyingKey>,
    end_epoch_mc_b_hash: Option<BlockHash>,
    prev_end_epoch_mc_b_hash: Option<BlockHash>,
    bt_list: Vec<BackwardTransfer>,
}

impl<'a, E: ProofEngine, C: ActiveChain + ?Sized> CertProofVerificationSession<'a, E, C> {
    /// Creates an empty session; nothing is read until
    /// [`Self::create_parameters`].
    pub fn new(
        engine: &'a E,
        chain: &'a C,
        cert: &'a WithdrawalCertificate,
        sc_info: &'a SidechainInfo,
    ) -> Self {
        Self {
            engine,
            chain,
            cert,
            sc_info,
            state: SessionState::Empty,
            constant: None,
            quality: 0,
            proofdata: None,
            sc_proof: None,
            sc_vk: None,
            end_epoch_mc_b_hash: None,
            prev_end_epoch_mc_b_hash: None,
            bt_list: Vec::new(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn constant(&self) -> Option<&E::Field> {
        self.constant.as_ref()
    }

    pub fn quality(&self) -> u64 {
        self.quality
    }

    pub fn proofdata(&self) -> Option<&E::Field> {
        self.proofdata.as_ref()
    }

    pub fn sc_proof(&self) -> Option<&E::Proof> {
        self.sc_proof.as_ref()
    }

    pub fn sc_vk(&self) -> Option<&E::VerifyingKey> {
        self.sc_vk.as_ref()
    }

    pub fn end_epoch_mc_b_hash(&self) -> Option<&BlockHash> {
        self.end_epoch_mc_b_hash.as_ref()
    }

    pub fn prev_end_epoch_mc_b_hash(&self) -> Option<&BlockHash> {
        self.prev_end_epoch_mc_b_hash.as_ref()
    }

    pub fn bt_list(&self) -> &[BackwardTransfer] {
        &self.bt_list
    }

    /// Deserializes all verification inputs (`Empty -> Prepared`).
    ///
    /// On error the session stays `Empty` and holds no handle.
    pub fn create_parameters(&mut self) -> Result<(), SessionError> {
        if self.state != SessionState::Empty {
            return Err(SessionError::InvalidState {
                op: "create_parameters",
                state: self.state,
            });
        }

        let assembled = self.assemble().inspect_err(|e| {
            tracing::warn!(
                sidechain = %self.cert.sidechain_id.as_hash().to_hex(),
                epoch = self.cert.epoch_number,
                "create_parameters(): {e}"
            );
        })?;

        self.constant = assembled.constant;
        self.quality = assembled.quality;
        self.proofdata = assembled.proofdata;
        self.sc_proof = Some(assembled.sc_proof);
        self.sc_vk = Some(assembled.sc_vk);
        self.end_epoch_mc_b_hash = Some(assembled.end_epoch_mc_b_hash);
        self.prev_end_epoch_mc_b_hash = Some(assembled.prev_end_epoch_mc_b_hash);
        self.bt_list = assembled.bt_list;
        self.state = SessionState::Prepared;
        Ok(())
    }

    fn assemble(&self) -> Result<Assembled<E>, SessionError> {
        // The constant is optional: an empty buffer means the circuit has none.
        // For now it must be a single field element.
        let constant_bytes = &self.sc_info.constant;
        let constant = if constant_bytes.is_empty() {
            None
        } else {
            Some(deserialize_fixed(
                "constant",
                constant_bytes,
                self.engine.field_size(),
                |b| self.engine.deserialize_field(b),
            )?)
        };

        let quality = self.cert.quality;
        // No certificate version carries proof data yet.
        let proofdata = None;

        let sc_proof = deserialize_fixed(
            "sc_proof",
            &self.cert.sc_proof,
            self.engine.proof_size(),
            |b| self.engine.deserialize_proof(b),
        )?;

        let vk_bytes = store::load_sc_vk_from_file(&self.sc_info.w_cert_vk_path)?;
        let sc_vk = self
            .engine
            .deserialize_vk(&vk_bytes)
            .ok_or(SessionError::Deserialization { field: "sc_vk" })?;

        let end_epoch_mc_b_hash = self.cert.end_epoch_block_hash;
        let prev_end_epoch_mc_b_hash = self.prev_end_epoch_block_hash()?;

        let bt_list = self.cert.backward_transfers();

        Ok(Assembled {
            constant,
            quality,
            proofdata,
            sc_proof,
            sc_vk,
            end_epoch_mc_b_hash,
            prev_end_epoch_mc_b_hash,
            bt_list,
        })
    }

    /// Hash of the last block of the previous epoch, i.e. the block just
    /// below the start of the certificate's epoch.
    fn prev_end_epoch_block_hash(&self) -> Result<BlockHash, SessionError> {
        let epoch = self.cert.epoch_number;
        let target_height = self
            .sc_info
            .start_height_for_epoch(epoch)
            .checked_sub(1)
            .ok_or(SessionError::EpochStartUnderflow { epoch })?;

        self.chain
            .block_hash_at(target_height)
            .ok_or(SessionError::MissingChainEntry {
                height: target_height,
            })
    }

    /// Runs the verification predicate (`Prepared -> Verified |
    /// VerificationFailed`).
    pub fn verifier_call(&mut self) -> Result<Verdict, SessionError> {
        let invalid = SessionError::InvalidState {
            op: "verifier_call",
            state: self.state,
        };
        if self.state != SessionState::Prepared {
            return Err(invalid);
        }
        let (Some(end), Some(prev), Some(sc_proof), Some(sc_vk)) = (
            self.end_epoch_mc_b_hash.as_ref(),
            self.prev_end_epoch_mc_b_hash.as_ref(),
            self.sc_proof.as_ref(),
            self.sc_vk.as_ref(),
        ) else {
            return Err(invalid);
        };

        let inputs = ProofInputs {
            end_epoch_mc_b_hash: end,
            prev_end_epoch_mc_b_hash: prev,
            bt_list: &self.bt_list,
            quality: self.quality,
            constant: self.constant.as_ref(),
            proofdata: self.proofdata.as_ref(),
            sc_proof,
            sc_vk,
        };

        let verdict = match self.engine.verify(&inputs) {
            Ok(true) => Verdict::Verified,
            Ok(false) => {
                tracing::debug!(
                    sidechain = %self.cert.sidechain_id.as_hash().to_hex(),
                    epoch = self.cert.epoch_number,
                    "sc_proof does not verify"
                );
                Verdict::NotVerified
            }
            Err(e) => {
                tracing::error!(
                    sidechain = %self.cert.sidechain_id.as_hash().to_hex(),
                    epoch = self.cert.epoch_number,
                    "failed to verify \"sc_proof\": {e}"
                );
                Verdict::EngineFailure(e)
            }
        };

        self.state = if verdict.is_verified() {
            SessionState::Verified
        } else {
            SessionState::VerificationFailed
        };
        Ok(verdict)
    }

    /// Releases every handle and resets engine error state (`* -> Released`).
    ///
    /// Safe to call in any state and any number of times.
    pub fn free_parameters(&mut self) {
        // Borrowed from the certificate and the chain; only forgotten here.
        self.end_epoch_mc_b_hash = None;
        self.prev_end_epoch_mc_b_hash = None;

        self.constant = None;
        self.proofdata = None;
        self.sc_proof = None;
        self.sc_vk = None;
        self.bt_list.clear();

        self.engine.clear_error();
        self.state = SessionState::Released;
    }
}

impl<E: ProofEngine, C: ActiveChain + ?Sized> Drop for CertProofVerificationSession<'_, E, C> {
    fn drop(&mut self) {
        if self.state != SessionState::Released {
            self.free_parameters();
        }
    }
}

fn deserialize_fixed<T>(
    field: &'static str,
    bytes: &[u8],
    expected: usize,
    deserialize: impl FnOnce(&[u8]) -> Option<T>,
) -> Result<T, SessionError> {
    if bytes.len() != expected {
        return Err(SessionError::MalformedInput {
            field,
            expected,
            found: bytes.len(),
        });
    }
    deserialize(bytes).ok_or(SessionError::Deserialization { field })
}

/// Runs a full create / call / free cycle for `cert`.
///
/// Parameters are released before returning, whatever the outcome.
pub fn verify_certificate_proof<E, C>(
    engine: &E,
    chain: &C,
    cert: &WithdrawalCertificate,
    sc_info: &SidechainInfo,
) -> Result<Verdict, SessionError>
where
    E: ProofEngine,
    C: ActiveChain + ?Sized,
{
    let mut session = CertProofVerificationSession::new(engine, chain, cert, sc_info);
    let result = session
        .create_parameters()
        .and_then(|()| session.verifier_call());
    session.free_parameters();
    result
}
