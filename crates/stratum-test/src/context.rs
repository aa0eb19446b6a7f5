//! Builder for invocation contexts.

use std::time::Duration;

use serde_json::Value;
use stratum_core::Context;

/// Fluent builder for a [`Context`].
///
/// Remaining time is applied when [`build`](Self::build) is called, so the
/// deadline is measured from that moment on the tokio clock.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use stratum_test::TestContext;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let context = TestContext::new()
///     .function_name("orders")
///     .request_id("req-1")
///     .remaining(Duration::from_millis(1_000))
///     .build();
///
/// assert_eq!(context.request_id, "req-1");
/// assert!(context.remaining_time_in_millis().unwrap() <= 1_000);
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct TestContext {
    function_name: Option<String>,
    request_id: Option<String>,
    remaining: Option<Duration>,
    metadata: Vec<(String, Value)>,
}

impl TestContext {
    /// Starts a builder with no deadline.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the function name.
    pub fn function_name(mut self, name: impl Into<String>) -> Self {
        self.function_name = Some(name.into());
        self
    }

    /// Sets the request ID.
    pub fn request_id(mut self, id: impl Into<String>) -> Self {
        self.request_id = Some(id.into());
        self
    }

    /// Gives the invocation a deadline `remaining` from build time.
    pub fn remaining(mut self, remaining: Duration) -> Self {
        self.remaining = Some(remaining);
        self
    }

    /// Shorthand for [`remaining`](Self::remaining) in milliseconds.
    pub fn remaining_millis(self, millis: u64) -> Self {
        self.remaining(Duration::from_millis(millis))
    }

    /// Adds a metadata entry.
    pub fn metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.push((key.into(), value));
        self
    }

    /// Builds the context.
    #[must_use]
    pub fn build(self) -> Context {
        let mut context = match self.function_name {
            Some(name) => Context::new(name),
            None => Context::default(),
        };
        if let Some(id) = self.request_id {
            context = context.with_request_id(id);
        }
        if let Some(remaining) = self.remaining {
            context = context.with_remaining_time(remaining);
        }
        context.metadata.extend(self.metadata);
        context
    }
}
