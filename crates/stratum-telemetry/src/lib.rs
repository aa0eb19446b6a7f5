//! Observability for Stratum functions.
//!
//! - **Logging**: `tracing-subscriber` output, JSON for production, pretty for development
//! - **Metrics**: Prometheus-format registry via the `metrics` crate
//! - **Plugin**: [`TracingPlugin`] wires both into the engine lifecycle
//!
//! # Standard Metrics
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `stratum_invocations_total` | Counter | `outcome` | Finished invocations |
//! | `stratum_invocation_errors_total` | Counter | `category` | Invocations with an error |
//! | `stratum_invocation_duration_seconds` | Histogram | `outcome` | Invocation latency |
//! | `stratum_middleware_calls_total` | Counter | `name` | Hook executions |
//! | `stratum_in_flight_invocations` | Gauge | - | Running invocations |
//!
//! # Example
//!
//! ```rust,ignore
//! use stratum_telemetry::{init_telemetry, TelemetryConfig};
//!
//! init_telemetry(&TelemetryConfig::default())?;
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod logging;
pub mod metrics;
mod plugin;

pub use error::TelemetryError;
pub use logging::{init_logging, LogConfig};
pub use metrics::{init_metrics, render_metrics, MetricsConfig};
pub use plugin::TracingPlugin;

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// Logging and metrics settings together.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TelemetryConfig {
    /// Logging settings.
    pub logging: LogConfig,
    /// Metrics settings.
    pub metrics: MetricsConfig,
}

/// Initializes logging, then metrics.
///
/// # Errors
///
/// Returns `TelemetryError` if either subsystem fails to initialize.
pub fn init_telemetry(config: &TelemetryConfig) -> TelemetryResult<()> {
    init_logging(&config.logging)?;
    init_metrics(&config.metrics)?;
    Ok(())
}
