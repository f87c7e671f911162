//! Metrics and instrumentation for certificate verification.
//!
//! This module defines Prometheus-compatible metrics for the proof
//! verification path and exposes a small HTTP exporter that serves
//! `/metrics` in Prometheus text format.
//!
//! Typical usage in a node:
//!
//! ```ignore
//! use std::net::SocketAddr;
//! use std::sync::Arc;
//! use cert_verifier::metrics::{MetricsRegistry, run_prometheus_http_server};
//!
//! let registry = Arc::new(MetricsRegistry::new()?);
//! let addr: SocketAddr = "127.0.0.1:9898".parse()?;
//!
//! tokio::spawn(run_prometheus_http_server(registry.clone(), addr));
//!
//! registry.verification.verification_seconds.observe(duration_secs);
//! ```

pub mod prometheus;

pub use prometheus::{MetricsRegistry, VerificationMetrics, run_prometheus_http_server};
