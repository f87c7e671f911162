//! Certificate verifier library crate.
//!
//! This crate provides the building blocks for verifying sidechain
//! withdrawal certificates against their zero-knowledge proofs:
//!
//! - strongly-typed domain types (`types`),
//! - a read-only view of the active mainchain (`chain`),
//! - the proof-engine seam and a reference engine (`engine`),
//! - verification-key storage (`store`),
//! - the parameter lifecycle of one verification (`session`),
//! - certificate validity predicates (`validation`),
//! - Prometheus-based metrics (`metrics`),
//! - and a top-level verifier configuration (`config`).
//!
//! Higher-level binaries compose these pieces into nodes and gateways.

pub mod chain;
pub mod config;
pub mod engine;
pub mod metrics;
pub mod session;
pub mod store;
pub mod types;
pub mod validation;

// Re-export top-level configuration types.
pub use config::{MetricsConfig, VerifierConfig};

pub use chain::{ActiveChain, InMemoryActiveChain};
pub use engine::{DigestEngine, EngineError, ProofEngine, ProofInputs};
pub use session::{
    CertProofVerificationSession, SessionError, SessionState, Verdict, verify_certificate_proof,
};
pub use store::{StoreError, VkStore, load_sc_vk_from_file, save_sc_vk_to_file};
pub use validation::{AcceptAllValidator, CertificateValidator, ProofValidity, ValidationError};

// Re-export metrics registry and verification metrics.
pub use metrics::{MetricsRegistry, VerificationMetrics, run_prometheus_http_server};

// Re-export domain types at the crate root for convenience.
pub use types::*;

/// Type alias for the validator stack used by a "typical" deployment.
pub type DefaultCertificateValidator = ProofValidity<DigestEngine>;
