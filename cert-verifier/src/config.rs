//! Top-level configuration for a certificate verifier.
//!
//! This module aggregates configuration for:
//!
//! - verification-key storage (root directory of per-sidechain keys),
//! - the proof engine (backward-transfer limit),
//! - metrics exporter (enable flag + listen address).
//!
//! Higher-level binaries construct a `VerifierConfig` from defaults and
//! override fields from the environment as needed.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use crate::engine::DigestEngine;
use crate::engine::digest::MAX_BACKWARD_TRANSFERS;
use crate::store::VkStore;

/// Default root directory for sidechain parameter files.
pub const DEFAULT_VK_DIR: &str = "data/sc-params";

/// Configuration for the Prometheus metrics exporter.
#[derive(Clone, Debug)]
pub struct MetricsConfig {
    /// Whether to run a `/metrics` HTTP exporter.
    pub enabled: bool,
    /// Address to bind the metrics HTTP server to.
    pub listen_addr: SocketAddr,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            listen_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 9898),
        }
    }
}

/// Top-level configuration for a certificate verifier.
#[derive(Clone, Debug)]
pub struct VerifierConfig {
    /// Root directory of the verification-key store.
    pub vk_dir: PathBuf,
    /// Largest backward-transfer list a certificate may carry.
    pub max_backward_transfers: usize,
    pub metrics: MetricsConfig,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            vk_dir: PathBuf::from(DEFAULT_VK_DIR),
            max_backward_transfers: MAX_BACKWARD_TRANSFERS,
            metrics: MetricsConfig::default(),
        }
    }
}

impl VerifierConfig {
    /// Opens the verification-key store rooted at `vk_dir`.
    pub fn vk_store(&self) -> VkStore {
        VkStore::new(self.vk_dir.clone())
    }

    /// Builds the proof engine with the configured limits.
    pub fn proof_engine(&self) -> DigestEngine {
        DigestEngine::with_max_backward_transfers(self.max_backward_transfers)
    }
}
