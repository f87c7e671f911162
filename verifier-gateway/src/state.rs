//! Shared application state.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use cert_verifier::{
    DefaultCertificateValidator, DigestEngine, InMemoryActiveChain, MetricsRegistry, ProofValidity,
    SidechainId, SidechainInfo, VkStore,
};

/// Shared state held by the API handlers.
///
/// This is wrapped in an [`Arc`] and passed to request handlers via Axum's
/// `State` extractor. The chain and sidechain maps use tokio locks so that
/// blocking verification threads can take them with `blocking_read`.
pub struct AppState {
    /// Active mainchain, fed by `POST /chain/blocks`.
    pub chain: RwLock<InMemoryActiveChain>,
    /// Registered sidechains.
    pub sidechains: RwLock<HashMap<SidechainId, SidechainInfo>>,
    /// Verification-key store.
    pub vk_store: VkStore,
    /// Certificate validator shared by all requests.
    pub validator: DefaultCertificateValidator,
    /// Metrics registry shared with the validator and the exporter.
    pub metrics: Arc<MetricsRegistry>,
}

impl AppState {
    pub fn new(vk_store: VkStore, engine: DigestEngine, metrics: Arc<MetricsRegistry>) -> Self {
        Self {
            chain: RwLock::new(InMemoryActiveChain::new()),
            sidechains: RwLock::new(HashMap::new()),
            vk_store,
            validator: ProofValidity::new(engine).with_metrics(metrics.clone()),
            metrics,
        }
    }
}

/// Thread-safe alias for `AppState`.
pub type SharedState = Arc<AppState>;
