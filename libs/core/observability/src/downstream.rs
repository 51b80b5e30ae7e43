//! Metrics for calls leaving the service.

use metrics::{counter, histogram};
use std::time::Duration;

/// Outcome label for a downstream call that returned a usable response.
pub const OUTCOME_OK: &str = "ok";
/// Outcome label for a downstream call that failed with an error response.
pub const OUTCOME_ERROR: &str = "error";
/// Outcome label for a downstream call that exceeded its deadline.
pub const OUTCOME_TIMEOUT: &str = "timeout";

/// Downstream metrics recorder
pub struct DownstreamMetrics;

impl DownstreamMetrics {
    /// Record one logical downstream call (retries count as one call).
    pub fn record_call(service: &'static str, outcome: &'static str, duration: Duration) {
        counter!(
            "downstream_calls_total",
            "service" => service,
            "outcome" => outcome
        )
        .increment(1);
        histogram!("downstream_call_duration_seconds", "service" => service)
            .record(duration.as_secs_f64());

        tracing::debug!(
            service = service,
            outcome = outcome,
            duration_ms = duration.as_millis() as u64,
            "Downstream call finished"
        );
    }

    /// Record a search hit whose image could not be signed or fetched.
    pub fn record_degraded_asset() {
        counter!("asset_fetch_degraded_total").increment(1);
    }
}
