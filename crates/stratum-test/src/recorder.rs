//! Recording middleware for ordering assertions.

use std::sync::Arc;

use parking_lot::Mutex;
use stratum_core::{BoxFuture, Flow, MiddlewareResult, Request};
use stratum_engine::Middleware;

/// A shared, ordered log of labels.
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    entries: Arc<Mutex<Vec<String>>>,
}

impl CallLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a label.
    pub fn record(&self, label: impl Into<String>) {
        self.entries.lock().push(label.into());
    }

    /// Returns every label recorded so far, in order.
    #[must_use]
    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().clone()
    }

    /// Returns how many times `label` was recorded.
    #[must_use]
    pub fn count(&self, label: &str) -> usize {
        self.entries.lock().iter().filter(|e| *e == label).count()
    }

    /// Returns `true` if `label` was recorded at least once.
    #[must_use]
    pub fn contains(&self, label: &str) -> bool {
        self.count(label) > 0
    }

    /// Forgets everything recorded.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

/// A hook that records `label` and continues.
pub fn record(
    log: &CallLog,
    label: impl Into<String>,
) -> impl for<'a> Fn(&'a mut Request) -> BoxFuture<'a, MiddlewareResult> + Send + Sync + 'static {
    let log = log.clone();
    let label = label.into();
    move |_request| {
        log.record(label.clone());
        Box::pin(async { Ok(Flow::Continue) })
    }
}

/// A middleware whose three hooks record `{name}.before`, `{name}.after` and
/// `{name}.on_error`.
#[must_use]
pub fn recording(name: &str, log: &CallLog) -> Middleware {
    Middleware::new(name.to_string())
        .before(record(log, format!("{name}.before")))
        .after(record(log, format!("{name}.after")))
        .on_error(record(log, format!("{name}.on_error")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use stratum_core::{Context, Internal};

    #[tokio::test]
    async fn test_recording_middleware() {
        let log = CallLog::new();
        let (before, after, on_error) = recording("m1", &log).into_hooks();
        let mut request = Request::new(json!({}), Context::default(), Internal::new());

        before.unwrap().call(&mut request).await.unwrap();
        after.unwrap().call(&mut request).await.unwrap();
        on_error.unwrap().call(&mut request).await.unwrap();

        assert_eq!(log.entries(), vec!["m1.before", "m1.after", "m1.on_error"]);
        assert_eq!(log.count("m1.after"), 1);

        log.clear();
        assert!(!log.contains("m1.before"));
    }
}
