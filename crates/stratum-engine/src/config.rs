//! Engine construction options.

use std::fmt;
use std::sync::Arc;

pub use stratum_config::DEFAULT_TIMEOUT_EARLY_IN_MILLIS;
use stratum_config::EngineSettings;
use stratum_core::{Error, Internal, NoopPlugin, Plugin, Response};

/// Produces the outcome of an invocation that hit the deadline guard.
pub type TimeoutResponse = Arc<dyn Fn() -> Result<Response, Error> + Send + Sync>;

/// Options fixed when an [`Engine`](crate::Engine) is built.
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use stratum_engine::EngineConfig;
///
/// let config = EngineConfig::default()
///     .timeout_early_in_millis(50)
///     .timeout_early_response(|| Ok(json!({ "statusCode": 504 })));
///
/// assert_eq!(config.timeout_early(), 50);
/// ```
#[derive(Clone)]
pub struct EngineConfig {
    timeout_early_in_millis: i64,
    timeout_early_response: TimeoutResponse,
    internal: Internal,
    plugin: Arc<dyn Plugin>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            timeout_early_in_millis: DEFAULT_TIMEOUT_EARLY_IN_MILLIS,
            timeout_early_response: Arc::new(|| Err(Error::timeout())),
            internal: Internal::new(),
            plugin: Arc::new(NoopPlugin),
        }
    }
}

impl EngineConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a configuration from loaded settings.
    #[must_use]
    pub fn from_settings(settings: &EngineSettings) -> Self {
        Self::default().timeout_early_in_millis(settings.timeout_early_in_millis)
    }

    /// Sets the margin before the deadline. Zero or negative disables the guard.
    pub fn timeout_early_in_millis(mut self, millis: i64) -> Self {
        self.timeout_early_in_millis = millis;
        self
    }

    /// Sets what the deadline guard resolves to. The default fails with
    /// [`Error::timeout`].
    pub fn timeout_early_response<F>(mut self, response: F) -> Self
    where
        F: Fn() -> Result<Response, Error> + Send + Sync + 'static,
    {
        self.timeout_early_response = Arc::new(response);
        self
    }

    /// Sets the internal store every request starts from.
    pub fn internal(mut self, internal: Internal) -> Self {
        self.internal = internal;
        self
    }

    /// Sets the lifecycle observer.
    pub fn plugin(mut self, plugin: impl Plugin) -> Self {
        self.plugin = Arc::new(plugin);
        self
    }

    /// Sets an already shared lifecycle observer.
    pub fn plugin_arc(mut self, plugin: Arc<dyn Plugin>) -> Self {
        self.plugin = plugin;
        self
    }

    /// Returns the deadline margin in milliseconds.
    #[must_use]
    pub fn timeout_early(&self) -> i64 {
        self.timeout_early_in_millis
    }

    /// Returns `true` if the deadline guard is active.
    #[must_use]
    pub fn deadline_guard_enabled(&self) -> bool {
        self.timeout_early_in_millis > 0
    }

    pub(crate) fn early_response(&self) -> Result<Response, Error> {
        (self.timeout_early_response)()
    }

    /// Returns the initial internal store.
    #[must_use]
    pub fn initial_internal(&self) -> &Internal {
        &self.internal
    }

    /// Returns the lifecycle observer.
    #[must_use]
    pub fn observer(&self) -> &dyn Plugin {
        self.plugin.as_ref()
    }
}

impl fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineConfig")
            .field("timeout_early_in_millis", &self.timeout_early_in_millis)
            .field("internal", &self.internal)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.timeout_early(), 5);
        assert!(config.deadline_guard_enabled());
        assert!(config.initial_internal().is_empty());

        let err = config.early_response().unwrap_err();
        assert!(err.is_timeout());
        assert_eq!(err.to_string(), "Timeout");
    }

    #[test]
    fn test_non_positive_margin_disables_guard() {
        assert!(!EngineConfig::new().timeout_early_in_millis(0).deadline_guard_enabled());
        assert!(!EngineConfig::new().timeout_early_in_millis(-10).deadline_guard_enabled());
    }

    #[test]
    fn test_custom_early_response() {
        let config = EngineConfig::new().timeout_early_response(|| Ok(json!("late")));
        assert_eq!(config.early_response().unwrap(), json!("late"));
    }

    #[test]
    fn test_from_settings() {
        let settings = EngineSettings {
            timeout_early_in_millis: 250,
        };
        assert_eq!(EngineConfig::from_settings(&settings).timeout_early(), 250);
    }
}
