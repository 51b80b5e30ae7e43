//! Observability utilities for the image search service.
//!
//! This crate provides:
//! - Prometheus metrics recording and export
//! - Downstream call metrics (embedding, chat completion, index, blob fetch)
//! - Axum middleware for automatic request metrics
//!
//! # Example
//!
//! ```rust,ignore
//! use observability::{init_metrics, metrics_handler, DownstreamMetrics};
//!
//! // Initialize metrics recorder
//! init_metrics()?;
//!
//! // Record a downstream call
//! DownstreamMetrics::record_call("vision", "ok", started.elapsed());
//!
//! // Add metrics endpoint to router
//! let app = Router::new()
//!     .route("/metrics", get(metrics_handler));
//! ```

pub mod downstream;
pub mod middleware;

pub use downstream::DownstreamMetrics;
pub use middleware::metrics_middleware;

// Re-export metrics macros for convenience
pub use metrics::{counter, gauge, histogram};

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use tracing::info;

static METRICS_HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

/// Initialize the Prometheus metrics recorder.
///
/// Call once at application startup; later calls return the same handle.
///
/// # Errors
/// Fails when another global recorder has already been installed.
pub fn init_metrics() -> Result<&'static PrometheusHandle, BuildError> {
    METRICS_HANDLE.get_or_try_init(|| {
        let handle = PrometheusBuilder::new().install_recorder()?;

        info!("Prometheus metrics recorder initialized");

        register_metric_descriptions();

        Ok(handle)
    })
}

/// Get the metrics handle (must call init_metrics first)
pub fn get_metrics_handle() -> Option<&'static PrometheusHandle> {
    METRICS_HANDLE.get()
}

/// Axum handler for /metrics endpoint
pub async fn metrics_handler() -> String {
    match get_metrics_handle() {
        Some(handle) => handle.render(),
        None => "# Metrics not initialized\n".to_string(),
    }
}

fn register_metric_descriptions() {
    use metrics::describe_counter;
    use metrics::describe_histogram;

    // HTTP metrics
    describe_counter!("http_requests_total", "Total number of HTTP requests");
    describe_histogram!(
        "http_request_duration_seconds",
        "HTTP request duration in seconds"
    );
    describe_counter!(
        "http_requests_errors_total",
        "Total number of HTTP request errors"
    );

    // Downstream metrics
    describe_counter!(
        "downstream_calls_total",
        "Downstream calls by service and outcome"
    );
    describe_histogram!(
        "downstream_call_duration_seconds",
        "Downstream call duration in seconds, retries included"
    );
    describe_counter!(
        "asset_fetch_degraded_total",
        "Search hits returned without image bytes"
    );
}
