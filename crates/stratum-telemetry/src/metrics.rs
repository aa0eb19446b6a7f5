//! Prometheus metrics for Stratum invocations.
//!
//! # Standard Metrics
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `stratum_invocations_total` | Counter | `outcome` | Finished invocations |
//! | `stratum_invocation_errors_total` | Counter | `category` | Invocations that carried an error |
//! | `stratum_invocation_duration_seconds` | Histogram | `outcome` | Invocation latency |
//! | `stratum_middleware_calls_total` | Counter | `name` | Hook executions |
//! | `stratum_in_flight_invocations` | Gauge | - | Invocations currently running |
//!
//! Functions have no scrape port, so the recorder is installed without an
//! HTTP listener. Render the registry with [`render_metrics`] and ship it
//! however the platform expects (log line, push, extension).

use crate::error::TelemetryError;
use crate::TelemetryResult;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use std::time::Duration;

/// Counter of finished invocations.
pub const INVOCATIONS_TOTAL: &str = "stratum_invocations_total";
/// Counter of invocations that carried an error.
pub const INVOCATION_ERRORS_TOTAL: &str = "stratum_invocation_errors_total";
/// Histogram of invocation latency.
pub const INVOCATION_DURATION_SECONDS: &str = "stratum_invocation_duration_seconds";
/// Counter of hook executions.
pub const MIDDLEWARE_CALLS_TOTAL: &str = "stratum_middleware_calls_total";
/// Gauge of running invocations.
pub const IN_FLIGHT_INVOCATIONS: &str = "stratum_in_flight_invocations";

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Metrics configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsConfig {
    /// Whether metrics are enabled.
    pub enabled: bool,

    /// Histogram buckets for invocation duration, in seconds.
    pub duration_buckets: Vec<f64>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            duration_buckets: vec![
                0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0,
            ],
        }
    }
}

/// Installs the global Prometheus recorder.
///
/// # Errors
///
/// Returns `TelemetryError::MetricsInit` if the buckets are rejected or a
/// recorder is already installed.
pub fn init_metrics(config: &MetricsConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full(INVOCATION_DURATION_SECONDS.to_string()),
            &config.duration_buckets,
        )
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?
        .install_recorder()
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;

    let _ = METRICS_HANDLE.set(handle);
    describe_metrics();

    Ok(())
}

/// Renders the global registry in Prometheus text format.
///
/// Returns `None` if [`init_metrics`] has not run.
#[must_use]
pub fn render_metrics() -> Option<String> {
    METRICS_HANDLE.get().map(PrometheusHandle::render)
}

/// Registers descriptions for the standard metrics with the current recorder.
pub fn describe_metrics() {
    describe_counter!(INVOCATIONS_TOTAL, "Total number of finished invocations");
    describe_counter!(
        INVOCATION_ERRORS_TOTAL,
        "Total number of invocations that carried an error"
    );
    describe_histogram!(
        INVOCATION_DURATION_SECONDS,
        metrics::Unit::Seconds,
        "Invocation duration in seconds"
    );
    describe_counter!(MIDDLEWARE_CALLS_TOTAL, "Total number of hook executions");
    describe_gauge!(IN_FLIGHT_INVOCATIONS, "Number of invocations currently running");
}

/// Records a finished invocation.
pub fn record_invocation(outcome: &'static str, duration: Duration) {
    counter!(INVOCATIONS_TOTAL, "outcome" => outcome).increment(1);
    histogram!(INVOCATION_DURATION_SECONDS, "outcome" => outcome).record(duration.as_secs_f64());
}

/// Records an invocation error by category.
pub fn record_error(category: &'static str) {
    counter!(INVOCATION_ERRORS_TOTAL, "category" => category).increment(1);
}

/// Records one hook execution.
pub fn record_middleware_call(name: &str) {
    counter!(MIDDLEWARE_CALLS_TOTAL, "name" => name.to_string()).increment(1);
}

/// Increments the in-flight gauge.
pub fn increment_in_flight() {
    gauge!(IN_FLIGHT_INVOCATIONS).increment(1.0);
}

/// Decrements the in-flight gauge.
pub fn decrement_in_flight() {
    gauge!(IN_FLIGHT_INVOCATIONS).decrement(1.0);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_buckets_are_sorted() {
        let config = MetricsConfig::default();
        assert!(config.enabled);
        assert!(config.duration_buckets.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_recording_functions_render() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        metrics::with_local_recorder(&recorder, || {
            describe_metrics();
            record_invocation("success", Duration::from_millis(12));
            record_invocation("failed", Duration::from_millis(3));
            record_error("timeout");
            record_middleware_call("auth.before");
            record_middleware_call("auth.before");
            increment_in_flight();
        });

        let output = handle.render();
        assert!(output.contains(r#"stratum_invocations_total{outcome="success"} 1"#));
        assert!(output.contains(r#"stratum_invocation_errors_total{category="timeout"} 1"#));
        assert!(output.contains(r#"stratum_middleware_calls_total{name="auth.before"} 2"#));
        assert!(output.contains("stratum_in_flight_invocations 1"));
        assert!(output.contains(INVOCATION_DURATION_SECONDS));
    }

    #[test]
    fn test_disabled_metrics() {
        let config = MetricsConfig {
            enabled: false,
            ..MetricsConfig::default()
        };
        assert!(init_metrics(&config).is_ok());
        assert!(render_metrics().is_none());
    }
}
