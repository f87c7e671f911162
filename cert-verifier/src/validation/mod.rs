//! Certificate validity predicates.
//!
//! A [`CertificateValidator`] decides whether a withdrawal certificate may
//! be accepted for a registered sidechain, given the current active chain.
//!
//! It currently provides:
//!
//! - [`ProofValidity`]: verifies the certificate's SNARK proof through a
//!   [`ProofEngine`](crate::engine::ProofEngine).
//! - [`AcceptAllValidator`]: accepts everything, for tests and wiring.

pub mod error;
pub mod proof;

pub use error::ValidationError;
pub use proof::ProofValidity;

use crate::chain::ActiveChain;
use crate::types::{SidechainInfo, WithdrawalCertificate};

/// Pluggable validity predicate for withdrawal certificates.
///
/// Implementations should be deterministic and side-effect free, apart
/// from logging and metrics.
pub trait CertificateValidator: Send + Sync {
    fn validate(
        &self,
        cert: &WithdrawalCertificate,
        sc_info: &SidechainInfo,
        chain: &dyn ActiveChain,
    ) -> Result<(), ValidationError>;
}

/// A trivial validator that accepts every certificate.
pub struct AcceptAllValidator;

impl CertificateValidator for AcceptAllValidator {
    fn validate(
        &self,
        _cert: &WithdrawalCertificate,
        _sc_info: &SidechainInfo,
        _chain: &dyn ActiveChain,
    ) -> Result<(), ValidationError> {
        Ok(())
    }
}
