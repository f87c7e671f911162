//! Proof validity predicate for withdrawal certificates.
//!
//! [`ProofValidity`] runs one verification session per certificate and
//! folds the outcome into a single accept / reject decision. The cause of
//! a rejection is kept in the returned [`ValidationError`] and in the
//! verification metrics.

use std::sync::Arc;
use std::time::Instant;

use crate::chain::ActiveChain;
use crate::engine::ProofEngine;
use crate::metrics::MetricsRegistry;
use crate::session::{Verdict, verify_certificate_proof};
use crate::types::{SidechainInfo, WithdrawalCertificate};

use super::{CertificateValidator, ValidationError};

/// Certificate validator backed by a [`ProofEngine`].
pub struct ProofValidity<E> {
    engine: E,
    metrics: Option<Arc<MetricsRegistry>>,
}

impl<E: ProofEngine> ProofValidity<E> {
    /// Constructs a validator without metrics.
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            metrics: None,
        }
    }

    /// Records latency and outcome counters into `metrics`.
    pub fn with_metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    fn record(&self, started: Instant, outcome: &Result<(), ValidationError>) {
        let Some(metrics) = &self.metrics else {
            return;
        };
        let m = &metrics.verification;
        m.verification_seconds
            .observe(started.elapsed().as_secs_f64());
        match outcome {
            Ok(()) => m.certificates_verified.inc(),
            Err(ValidationError::ProofRejected) => m.certificates_rejected.inc(),
            Err(ValidationError::Parameters(_)) => m.parameter_failures.inc(),
            Err(ValidationError::Engine(_)) => m.engine_errors.inc(),
        }
    }
}

impl<E: ProofEngine> CertificateValidator for ProofValidity<E> {
    fn validate(
        &self,
        cert: &WithdrawalCertificate,
        sc_info: &SidechainInfo,
        chain: &dyn ActiveChain,
    ) -> Result<(), ValidationError> {
        let started = Instant::now();

        let outcome = match verify_certificate_proof(&self.engine, chain, cert, sc_info) {
            Ok(Verdict::Verified) => Ok(()),
            Ok(Verdict::NotVerified) => Err(ValidationError::ProofRejected),
            Ok(Verdict::EngineFailure(e)) => Err(ValidationError::Engine(e)),
            Err(e) => Err(ValidationError::Parameters(e)),
        };
        self.record(started, &outcome);

        match &outcome {
            Ok(()) => tracing::debug!(
                sidechain = %cert.sidechain_id.as_hash().to_hex(),
                epoch = cert.epoch_number,
                quality = cert.quality,
                "certificate proof verified"
            ),
            Err(e) => tracing::info!(
                sidechain = %cert.sidechain_id.as_hash().to_hex(),
                epoch = cert.epoch_number,
                "{e}"
            ),
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::InMemoryActiveChain;
    use crate::engine::DigestEngine;
    use crate::engine::EngineError;
    use crate::engine::digest::ProofStatement;
    use crate::session::SessionError;
    use crate::store::VkStore;
    use crate::types::{
        BlockHash, HASH_LEN, Hash256, PUB_KEY_HASH_LEN, PubKeyHash, SidechainId, TxOut,
    };
    use crate::validation::AcceptAllValidator;
    use tempfile::TempDir;

    fn block_hash(height: u64) -> BlockHash {
        BlockHash(Hash256::compute(&height.to_le_bytes()))
    }

    struct Setup {
        _tmp: TempDir,
        sc_info: SidechainInfo,
        cert: WithdrawalCertificate,
        chain: InMemoryActiveChain,
    }

    /// Sidechain created at height 4 with 3-block epochs; the certificate
    /// closes epoch 1, so the previous epoch ends at height 6.
    fn setup() -> Setup {
        let tmp = TempDir::new().expect("create temp dir");
        let store = VkStore::new(tmp.path());
        let sidechain_id = SidechainId(Hash256([9u8; HASH_LEN]));
        let vk = DigestEngine::generate_vk(b"validation-tests", false);
        let vk_path = store.save(&sidechain_id, &vk).expect("save vk");

        let sc_info = SidechainInfo {
            sidechain_id,
            creation_block_height: 4,
            withdrawal_epoch_length: 3,
            constant: Vec::new(),
            w_cert_vk_path: vk_path,
        };
        let chain = InMemoryActiveChain::from_hashes((0..12).map(block_hash).collect());

        let mut cert = WithdrawalCertificate {
            sidechain_id,
            epoch_number: 1,
            quality: 7,
            end_epoch_block_hash: block_hash(9),
            sc_proof: Vec::new(),
            outputs: vec![TxOut::backward_transfer(
                PubKeyHash([4u8; PUB_KEY_HASH_LEN]),
                50,
            )],
        };
        let statement = ProofStatement {
            end_epoch_mc_b_hash: cert.end_epoch_block_hash,
            prev_end_epoch_mc_b_hash: block_hash(6),
            bt_list: cert.backward_transfers(),
            quality: cert.quality,
            constant: Vec::new(),
        };
        cert.sc_proof = DigestEngine::new()
            .prove(&vk, &statement)
            .expect("prove statement");

        Setup {
            _tmp: tmp,
            sc_info,
            cert,
            chain,
        }
    }

    fn validator_with_metrics() -> (ProofValidity<DigestEngine>, Arc<MetricsRegistry>) {
        let metrics = Arc::new(MetricsRegistry::new().expect("create metrics registry"));
        let validator = ProofValidity::new(DigestEngine::new()).with_metrics(metrics.clone());
        (validator, metrics)
    }

    #[test]
    fn accepts_certificate_with_valid_proof() {
        let s = setup();
        let (validator, metrics) = validator_with_metrics();

        validator
            .validate(&s.cert, &s.sc_info, &s.chain)
            .expect("valid certificate");

        assert_eq!(metrics.verification.certificates_verified.get(), 1);
        assert_eq!(metrics.verification.verification_seconds.get_sample_count(), 1);
    }

    #[test]
    fn rejects_certificate_whose_quality_was_tampered_with() {
        let mut s = setup();
        s.cert.quality += 1;
        let (validator, metrics) = validator_with_metrics();

        let err = validator
            .validate(&s.cert, &s.sc_info, &s.chain)
            .unwrap_err();

        assert!(matches!(err, ValidationError::ProofRejected), "got {err:?}");
        assert_eq!(metrics.verification.certificates_rejected.get(), 1);
    }

    #[test]
    fn malformed_proof_is_a_parameter_failure() {
        let mut s = setup();
        s.cert.sc_proof.truncate(10);
        let (validator, metrics) = validator_with_metrics();

        let err = validator
            .validate(&s.cert, &s.sc_info, &s.chain)
            .unwrap_err();

        assert!(
            matches!(
                err,
                ValidationError::Parameters(SessionError::MalformedInput {
                    field: "sc_proof",
                    ..
                })
            ),
            "got {err:?}"
        );
        assert_eq!(metrics.verification.parameter_failures.get(), 1);
    }

    #[test]
    fn unexpected_constant_is_an_engine_failure() {
        let mut s = setup();
        s.sc_info.constant = DigestEngine::field_from_seed(b"stray-constant");
        let (validator, metrics) = validator_with_metrics();

        let err = validator
            .validate(&s.cert, &s.sc_info, &s.chain)
            .unwrap_err();

        assert!(
            matches!(
                err,
                ValidationError::Engine(EngineError::ConstantMismatch {
                    expected: false,
                    supplied: true
                })
            ),
            "got {err:?}"
        );
        assert_eq!(metrics.verification.engine_errors.get(), 1);
    }

    #[test]
    fn short_chain_is_a_parameter_failure() {
        let mut s = setup();
        s.chain.truncate_above(5);
        let validator = ProofValidity::new(DigestEngine::new());

        let err = validator
            .validate(&s.cert, &s.sc_info, &s.chain)
            .unwrap_err();

        assert!(
            matches!(
                err,
                ValidationError::Parameters(SessionError::MissingChainEntry { height: 6 })
            ),
            "got {err:?}"
        );
    }

    #[test]
    fn accept_all_validator_accepts_anything() {
        let mut s = setup();
        s.cert.sc_proof.clear();
        assert!(
            AcceptAllValidator
                .validate(&s.cert, &s.sc_info, &s.chain)
                .is_ok()
        );
    }
}
