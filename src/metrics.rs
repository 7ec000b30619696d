use metrics::{counter, histogram};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use crate::error::ErrorKind;

/// Total backend calls, labelled by operation and outcome
pub const API_CALLS_TOTAL: &str = "auditor_dashboard_api_calls_total";
/// Backend call latency, labelled by operation
pub const API_CALL_DURATION: &str = "auditor_dashboard_api_call_duration_seconds";
/// Failed calls, labelled by error kind
pub const ERRORS_TOTAL: &str = "auditor_dashboard_errors_total";
/// Validation rejections raised before a call was made
pub const VALIDATION_REJECTIONS_TOTAL: &str = "auditor_dashboard_validation_rejections_total";

/// Metrics collection for backend calls.
///
/// Values go to the `metrics` facade (a no-op until the embedder installs a
/// recorder) and are also tallied locally so a process can report them.
#[derive(Debug, Default)]
pub struct ApiMetrics {
    calls: AtomicU64,
    errors: AtomicU64,
    rejections: AtomicU64,
}

impl ApiMetrics {
    /// Fresh collector with zero tallies
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one backend call
    pub fn record_call(&self, operation: &'static str, duration: Duration, failure: Option<ErrorKind>) {
        let status = if failure.is_some() { "error" } else { "success" };

        self.calls.fetch_add(1, Ordering::Relaxed);
        counter!(API_CALLS_TOTAL, "operation" => operation, "status" => status).increment(1);
        histogram!(API_CALL_DURATION, "operation" => operation).record(duration.as_secs_f64());

        if let Some(kind) = failure {
            self.errors.fetch_add(1, Ordering::Relaxed);
            counter!(ERRORS_TOTAL, "kind" => kind.as_str(), "operation" => operation).increment(1);
        }
    }

    /// Record an input rejected on the client side
    pub fn record_rejection(&self, operation: &'static str) {
        self.rejections.fetch_add(1, Ordering::Relaxed);
        counter!(VALIDATION_REJECTIONS_TOTAL, "operation" => operation).increment(1);
    }

    /// Calls recorded so far
    pub fn calls_total(&self) -> u64 {
        self.calls.load(Ordering::Relaxed)
    }

    /// Failed calls recorded so far
    pub fn errors_total(&self) -> u64 {
        self.errors.load(Ordering::Relaxed)
    }

    /// Client-side rejections recorded so far
    pub fn rejections_total(&self) -> u64 {
        self.rejections.load(Ordering::Relaxed)
    }
}

/// Performance timing wrapper for metrics
pub struct MetricsTimer<'a> {
    metrics: &'a ApiMetrics,
    operation: &'static str,
    start: Instant,
}

impl<'a> MetricsTimer<'a> {
    /// Start timing `operation`
    pub fn new(metrics: &'a ApiMetrics, operation: &'static str) -> Self {
        Self { metrics, operation, start: Instant::now() }
    }

    /// Record the call with its outcome
    pub fn finish(self, failure: Option<ErrorKind>) {
        self.metrics.record_call(self.operation, self.start.elapsed(), failure);
    }
}
