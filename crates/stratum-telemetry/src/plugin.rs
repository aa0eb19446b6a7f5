//! A lifecycle plugin that logs and records metrics.

use stratum_core::{Plugin, Request};

use crate::metrics;

/// Logs every lifecycle point with `tracing` and records the standard
/// metrics.
///
/// # Example
///
/// ```
/// use stratum_core::PluginSet;
/// use stratum_telemetry::TracingPlugin;
///
/// let plugins = PluginSet::new().with(TracingPlugin::new().with_hook_metrics());
/// assert_eq!(plugins.len(), 1);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingPlugin {
    record_hooks: bool,
}

impl TracingPlugin {
    /// Creates a plugin that records invocation-level metrics only.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            record_hooks: false,
        }
    }

    /// Also counts every hook execution by name.
    #[must_use]
    pub const fn with_hook_metrics(mut self) -> Self {
        self.record_hooks = true;
        self
    }
}

/// Classifies a finished request for the `outcome` label.
fn outcome(request: &Request) -> &'static str {
    match (&request.error, &request.response) {
        (None, _) => "success",
        (Some(_), Some(_)) => "recovered",
        (Some(_), None) => "failed",
    }
}

impl Plugin for TracingPlugin {
    fn before_prefetch(&self) {
        tracing::debug!("engine prefetch");
    }

    fn request_start(&self) {
        tracing::trace!("request start");
        metrics::increment_in_flight();
    }

    fn before_middleware(&self, name: &str) {
        tracing::trace!(hook = name, "hook start");
        if self.record_hooks {
            metrics::record_middleware_call(name);
        }
    }

    fn after_middleware(&self, name: &str) {
        tracing::trace!(hook = name, "hook end");
    }

    fn before_handler(&self) {
        tracing::trace!("handler start");
    }

    fn after_handler(&self) {
        tracing::trace!("handler end");
    }

    fn request_end(&self, request: &Request) {
        let elapsed = request.elapsed();
        let outcome = outcome(request);

        metrics::decrement_in_flight();
        metrics::record_invocation(outcome, elapsed);

        match &request.error {
            Some(error) => {
                metrics::record_error(error.category().as_str());
                if outcome == "failed" {
                    crate::log_invocation_error!(request.context.request_id, error);
                } else {
                    tracing::info!(
                        request_id = %request.context.request_id,
                        error = %error,
                        "Invocation recovered"
                    );
                }
            }
            None => {
                crate::log_invocation_complete!(
                    request.context.request_id,
                    elapsed.as_millis() as u64
                );
            }
        }
    }
}
