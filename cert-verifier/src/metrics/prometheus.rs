//! Prometheus-backed metrics and HTTP exporter.
//!
//! This module defines a [`MetricsRegistry`] that owns a Prometheus
//! registry and the certificate verification metrics, and an async HTTP
//! exporter that serves `/metrics` using `hyper`.

use std::{convert::Infallible, net::SocketAddr, sync::Arc};

use bytes::Bytes;
use http_body_util::Full;
use hyper::{
    Method, Request, Response, StatusCode, body::Incoming, header, server::conn::http1,
    service::service_fn,
};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;

use prometheus::{
    self, Encoder, Histogram, HistogramOpts, IntCounter, Opts, Registry, TextEncoder,
};

/// Certificate verification metrics.
///
/// Rejections are split by cause so operators can tell malformed
/// certificates, invalid proofs and engine failures apart.
#[derive(Clone)]
pub struct VerificationMetrics {
    /// Latency of a full create / call / free cycle, in seconds.
    pub verification_seconds: Histogram,
    /// Certificates whose proof verified.
    pub certificates_verified: IntCounter,
    /// Certificates whose proof did not verify.
    pub certificates_rejected: IntCounter,
    /// Certificates whose verification parameters could not be assembled.
    pub parameter_failures: IntCounter,
    /// Verifications aborted by an internal engine error.
    pub engine_errors: IntCounter,
}

impl VerificationMetrics {
    /// Registers verification metrics into the given `Registry`.
    pub fn register(registry: &Registry) -> Result<Self, prometheus::Error> {
        let verification_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "cert_proof_verification_seconds",
                "Time to assemble, verify and release certificate proof parameters in seconds",
            )
            .buckets(vec![
                0.0001, 0.0005, 0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5,
            ]),
        )?;
        registry.register(Box::new(verification_seconds.clone()))?;

        let certificates_verified = IntCounter::with_opts(Opts::new(
            "certificates_verified",
            "Total number of certificates whose proof verified",
        ))?;
        registry.register(Box::new(certificates_verified.clone()))?;

        let certificates_rejected = IntCounter::with_opts(Opts::new(
            "certificates_rejected",
            "Total number of certificates whose proof did not verify",
        ))?;
        registry.register(Box::new(certificates_rejected.clone()))?;

        let parameter_failures = IntCounter::with_opts(Opts::new(
            "certificate_parameter_failures",
            "Total number of certificates whose verification parameters could not be assembled",
        ))?;
        registry.register(Box::new(parameter_failures.clone()))?;

        let engine_errors = IntCounter::with_opts(Opts::new(
            "proof_engine_errors",
            "Total number of verifications aborted by a proof engine error",
        ))?;
        registry.register(Box::new(engine_errors.clone()))?;

        Ok(Self {
            verification_seconds,
            certificates_verified,
            certificates_rejected,
            parameter_failures,
            engine_errors,
        })
    }
}

/// Wrapper around a Prometheus registry and the verification metrics.
///
/// This is the main handle passed around in a node. It can be wrapped in
/// an [`Arc`] and shared across threads/tasks.
#[derive(Clone)]
pub struct MetricsRegistry {
    registry: Registry,
    pub verification: VerificationMetrics,
}

impl MetricsRegistry {
    /// Creates a new `MetricsRegistry` with a fresh underlying `Registry`
    /// and registers the verification metrics.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new_custom(Some("sc_verifier".to_string()), None)?;
        let verification = VerificationMetrics::register(&registry)?;
        Ok(Self {
            registry,
            verification,
        })
    }

    /// Encodes all metrics in this registry into the Prometheus text format.
    pub fn gather_text(&self) -> String {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();
        if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
            tracing::warn!("failed to encode Prometheus metrics: {e}");
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}

/// Runs an HTTP server that exposes Prometheus metrics.
///
/// The server listens on `addr` and serves `GET /metrics` with the
/// Prometheus text exposition format. All other paths return 404.
///
/// ```ignore
/// let registry = Arc::new(MetricsRegistry::new()?);
/// let addr: SocketAddr = "127.0.0.1:9898".parse()?;
/// tokio::spawn(run_prometheus_http_server(registry.clone(), addr));
/// ```
pub async fn run_prometheus_http_server(
    metrics: Arc<MetricsRegistry>,
    addr: SocketAddr,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let listener = TcpListener::bind(addr).await?;

    loop {
        let (stream, _) = listener.accept().await?;
        let io = TokioIo::new(stream);
        let metrics = metrics.clone();

        tokio::spawn(async move {
            let svc = service_fn(move |req| {
                let metrics = metrics.clone();
                handle_request(req, metrics)
            });

            if let Err(err) = http1::Builder::new().serve_connection(io, svc).await {
                tracing::warn!("prometheus HTTP server error: {err}");
            }
        });
    }
}

async fn handle_request(
    req: Request<Incoming>,
    metrics: Arc<MetricsRegistry>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let (status, content_type, body) = match (req.method(), req.uri().path()) {
        (&Method::GET, "/metrics") => (
            StatusCode::OK,
            "text/plain; version=0.0.4",
            metrics.gather_text(),
        ),
        _ => (
            StatusCode::NOT_FOUND,
            "text/plain",
            "not found".to_string(),
        ),
    };

    let mut resp = Response::new(Full::new(Bytes::from(body)));
    *resp.status_mut() = status;
    if let Ok(value) = header::HeaderValue::from_str(content_type) {
        resp.headers_mut().insert(header::CONTENT_TYPE, value);
    }
    Ok(resp)
}
