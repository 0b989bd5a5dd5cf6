//! Prometheus metrics for observability.
//!
//! This module provides metrics for monitoring the fetchzip server:
//! - HTTP request metrics (latency, counts)
//! - Operator status (collected on scrape)
//! - Core job, file and remote request metrics (registered from `fetchzip_core`)

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};

use fetchzip_core::OperatorStatus;

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "fetchzip_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("fetchzip_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "fetchzip_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

// =============================================================================
// Operator Metrics (collected on scrape)
// =============================================================================

/// Jobs currently holding a writer.
pub static ACTIVE_JOBS: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "fetchzip_active_jobs",
        "Number of jobs currently being processed",
    )
    .unwrap()
});

/// Admission limit.
pub static MAX_JOBS_PROCESSING: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "fetchzip_max_jobs_processing",
        "Maximum number of jobs processed at once",
    )
    .unwrap()
});

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    // HTTP
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))
        .unwrap();

    // Operator
    registry.register(Box::new(ACTIVE_JOBS.clone())).unwrap();
    registry
        .register(Box::new(MAX_JOBS_PROCESSING.clone()))
        .unwrap();

    // Core
    for metric in fetchzip_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Refresh gauges that mirror operator state.
pub fn update_operator_metrics(status: &OperatorStatus) {
    ACTIVE_JOBS.set(status.active_jobs as i64);
    MAX_JOBS_PROCESSING.set(status.max_jobs_processing as i64);
}

/// Encode all metrics in Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

/// Replace job IDs in a request path so label cardinality stays bounded.
///
/// `/api/archives/3f2b.../files` becomes `/api/archives/{id}/files`, and every
/// download under `public_path` collapses to `<public_path>/{file}`.
pub fn normalize_path(path: &str, public_path: &str) -> String {
    let public = public_path.trim_end_matches('/');
    if !public.is_empty() {
        if let Some(rest) = path.strip_prefix(public) {
            if rest.len() > 1 && rest.starts_with('/') {
                return format!("{}/{{file}}", public);
            }
        }
    }

    let segments: Vec<&str> = path.split('/').collect();
    let under_archives_api =
        segments.get(1) == Some(&"api") && segments.get(2) == Some(&"archives");

    segments
        .iter()
        .enumerate()
        .map(|(i, segment)| {
            if under_archives_api && i == 3 && !segment.is_empty() {
                "{id}"
            } else {
                *segment
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}
