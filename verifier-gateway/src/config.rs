//! Verifier gateway configuration.
//!
//! Defaults can be overridden through the environment:
//!
//! - `VERIFIER_LISTEN_ADDR`: HTTP listen address,
//! - `VERIFIER_VK_DIR`: root directory of stored verification keys,
//! - `VERIFIER_MAX_BACKWARD_TRANSFERS`: backward-transfer limit per certificate,
//! - `VERIFIER_METRICS_ADDR`: Prometheus exporter address.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use cert_verifier::VerifierConfig;

/// Configuration for the verifier gateway HTTP server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Address to bind the HTTP server to.
    pub listen_addr: SocketAddr,
    pub verifier: VerifierConfig,
}

impl Default for ApiConfig {
    fn default() -> Self {
        // All interfaces, so a container port mapping is reachable from the host.
        Self {
            listen_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 8081),
            verifier: VerifierConfig::default(),
        }
    }
}

impl ApiConfig {
    /// Builds a configuration from defaults and environment overrides.
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let mut cfg = Self::default();

        if let Some(addr) = lookup("VERIFIER_LISTEN_ADDR") {
            cfg.listen_addr = addr
                .parse()
                .map_err(|e| format!("invalid VERIFIER_LISTEN_ADDR {addr:?}: {e}"))?;
        }
        if let Some(dir) = lookup("VERIFIER_VK_DIR") {
            cfg.verifier.vk_dir = PathBuf::from(dir);
        }
        if let Some(max) = lookup("VERIFIER_MAX_BACKWARD_TRANSFERS") {
            cfg.verifier.max_backward_transfers = max
                .parse()
                .map_err(|e| format!("invalid VERIFIER_MAX_BACKWARD_TRANSFERS {max:?}: {e}"))?;
        }
        if let Some(addr) = lookup("VERIFIER_METRICS_ADDR") {
            cfg.verifier.metrics.listen_addr = addr
                .parse()
                .map_err(|e| format!("invalid VERIFIER_METRICS_ADDR {addr:?}: {e}"))?;
        }

        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_overrides() {
        let cfg = ApiConfig::from_lookup(|_| None).expect("default config");
        assert_eq!(cfg.listen_addr.to_string(), "0.0.0.0:8081");
        assert_eq!(cfg.verifier.vk_dir, PathBuf::from("data/sc-params"));
    }

    #[test]
    fn environment_overrides_apply() {
        let cfg = ApiConfig::from_lookup(|key| match key {
            "VERIFIER_LISTEN_ADDR" => Some("127.0.0.1:9000".to_string()),
            "VERIFIER_VK_DIR" => Some("/var/lib/sc-params".to_string()),
            "VERIFIER_MAX_BACKWARD_TRANSFERS" => Some("16".to_string()),
            _ => None,
        })
        .expect("config with overrides");

        assert_eq!(cfg.listen_addr.to_string(), "127.0.0.1:9000");
        assert_eq!(cfg.verifier.vk_dir, PathBuf::from("/var/lib/sc-params"));
        assert_eq!(cfg.verifier.max_backward_transfers, 16);
        assert_eq!(cfg.verifier.metrics.listen_addr.to_string(), "127.0.0.1:9898");
    }

    #[test]
    fn malformed_listen_addr_is_rejected() {
        let err = ApiConfig::from_lookup(|key| {
            (key == "VERIFIER_LISTEN_ADDR").then(|| "not-an-addr".to_string())
        })
        .unwrap_err();
        assert!(err.contains("VERIFIER_LISTEN_ADDR"));
    }
}
