use std::fmt;

use crate::engine::EngineError;
use crate::session::SessionError;

/// Error type returned when a certificate fails validation.
#[derive(Debug)]
pub enum ValidationError {
    /// Verification parameters could not be assembled from the certificate,
    /// the sidechain info or the stored key.
    Parameters(SessionError),
    /// The proof is well formed but does not verify.
    ProofRejected,
    /// The engine reported an internal error while verifying.
    Engine(EngineError),
}

impl From<SessionError> for ValidationError {
    fn from(e: SessionError) -> Self {
        ValidationError::Parameters(e)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::Parameters(e) => write!(f, "certificate rejected: {e}"),
            ValidationError::ProofRejected => {
                write!(f, "certificate rejected: proof does not verify")
            }
            ValidationError::Engine(e) => write!(f, "certificate rejected: {e}"),
        }
    }
}

impl std::error::Error for ValidationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ValidationError::Parameters(e) => Some(e),
            ValidationError::ProofRejected => None,
            ValidationError::Engine(e) => Some(e),
        }
    }
}
