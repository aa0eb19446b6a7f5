//! Invocation context types.
//!
//! The [`Context`] carries host-provided metadata about the current
//! invocation, most importantly the deadline the host will enforce.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;
use uuid::Uuid;

/// Metadata and capabilities handed to an invocation by the host runtime.
///
/// The deadline is measured on the tokio clock so that tests running with
/// paused time observe a consistent remaining budget.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use stratum_core::Context;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let ctx = Context::new("orders-handler").with_remaining_time(Duration::from_secs(3));
/// assert!(ctx.remaining_time_in_millis().unwrap() <= 3000);
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Context {
    /// Host-assigned identifier of this invocation.
    pub request_id: String,

    /// Name of the deployed function.
    pub function_name: String,

    /// Version of the deployed function.
    pub function_version: String,

    /// Memory configured for the function, in megabytes.
    pub memory_limit_in_mb: u32,

    /// Fully qualified identifier of the invoked function.
    pub invoked_function_arn: Option<String>,

    /// Log group the host writes this invocation's output to.
    pub log_group_name: Option<String>,

    /// Log stream the host writes this invocation's output to.
    pub log_stream_name: Option<String>,

    /// Free-form metadata. Middleware may add or rewrite entries.
    pub metadata: serde_json::Map<String, serde_json::Value>,

    /// When the host will forcibly end the invocation.
    deadline: Option<Instant>,
}

impl Context {
    /// Creates a context for the named function with a fresh request ID and
    /// no deadline.
    #[must_use]
    pub fn new(function_name: impl Into<String>) -> Self {
        Self {
            request_id: Uuid::now_v7().to_string(),
            function_name: function_name.into(),
            function_version: "$LATEST".to_string(),
            memory_limit_in_mb: 128,
            invoked_function_arn: None,
            log_group_name: None,
            log_stream_name: None,
            metadata: serde_json::Map::new(),
            deadline: None,
        }
    }

    /// Returns a new context with the specified request ID.
    #[must_use]
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = request_id.into();
        self
    }

    /// Returns a new context whose deadline is `remaining` from now.
    #[must_use]
    pub fn with_remaining_time(mut self, remaining: Duration) -> Self {
        self.deadline = Some(Instant::now() + remaining);
        self
    }

    /// Returns a new context with an absolute deadline.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Returns the deadline, if the host supplied one.
    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns the milliseconds left before the host deadline.
    ///
    /// `None` when no deadline is known. Never negative.
    #[must_use]
    pub fn remaining_time_in_millis(&self) -> Option<i64> {
        self.deadline.map(|deadline| {
            let remaining = deadline.saturating_duration_since(Instant::now());
            i64::try_from(remaining.as_millis()).unwrap_or(i64::MAX)
        })
    }

    /// Returns a serializable snapshot of the descriptive fields.
    #[must_use]
    pub fn summary(&self) -> ContextSummary {
        ContextSummary {
            request_id: self.request_id.clone(),
            function_name: self.function_name.clone(),
            function_version: self.function_version.clone(),
            memory_limit_in_mb: self.memory_limit_in_mb,
            remaining_time_in_millis: self.remaining_time_in_millis(),
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new("anonymous")
    }
}

/// Loggable view of a [`Context`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextSummary {
    /// Host-assigned identifier of this invocation.
    pub request_id: String,
    /// Name of the deployed function.
    pub function_name: String,
    /// Version of the deployed function.
    pub function_version: String,
    /// Memory configured for the function, in megabytes.
    pub memory_limit_in_mb: u32,
    /// Milliseconds left when the summary was taken.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_time_in_millis: Option<i64>,
}
