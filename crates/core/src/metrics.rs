//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Operator (admission, job completion)
//! - Files (validation, download, packing)
//! - Remote requests issued by the fetcher

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Operator - Job Metrics
// =============================================================================

/// Jobs admitted total.
pub static JOBS_CREATED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("fetchzip_jobs_created_total", "Total jobs admitted").unwrap()
});

/// Jobs rejected by admission control.
pub static JOBS_REJECTED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "fetchzip_jobs_rejected_total",
        "Total job creations rejected because too many jobs were processing",
    )
    .unwrap()
});

/// Jobs retired by outcome.
pub static JOBS_FINISHED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("fetchzip_jobs_finished_total", "Total jobs retired"),
        &["status"], // "done", "expired"
    )
    .unwrap()
});

// =============================================================================
// File Metrics
// =============================================================================

/// Attached URLs by validation outcome.
pub static FILES_ATTACHED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("fetchzip_files_attached_total", "Total URLs attached to jobs"),
        &["result"], // "accepted", "rejected", "over_limit"
    )
    .unwrap()
});

/// Downloads by outcome.
pub static DOWNLOADS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("fetchzip_downloads_total", "Total file downloads"),
        &["result"], // "success", "failed"
    )
    .unwrap()
});

/// Archive appends by outcome.
pub static PACKS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("fetchzip_packs_total", "Total archive appends"),
        &["result"], // "success", "failed"
    )
    .unwrap()
});

/// Archive append duration in seconds.
pub static PACK_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "fetchzip_pack_duration_seconds",
            "Duration of a full container rewrite",
        )
        .buckets(vec![0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
        &["result"],
    )
    .unwrap()
});

// =============================================================================
// Remote Request Metrics
// =============================================================================

/// Remote requests total.
pub static REMOTE_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "fetchzip_remote_requests_total",
            "Total requests to remote resources",
        ),
        &["operation", "status"], // operation: "validate", "download"
    )
    .unwrap()
});

/// Remote request duration.
pub static REMOTE_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "fetchzip_remote_request_duration_seconds",
            "Duration of requests to remote resources",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["operation"],
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(JOBS_CREATED.clone()),
        Box::new(JOBS_REJECTED.clone()),
        Box::new(JOBS_FINISHED.clone()),
        Box::new(FILES_ATTACHED.clone()),
        Box::new(DOWNLOADS.clone()),
        Box::new(PACKS.clone()),
        Box::new(PACK_DURATION.clone()),
        Box::new(REMOTE_REQUESTS.clone()),
        Box::new(REMOTE_REQUEST_DURATION.clone()),
    ]
}
