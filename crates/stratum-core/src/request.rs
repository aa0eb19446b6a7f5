//! Per-invocation request state.
//!
//! A [`Request`] is created for every invocation and threaded by mutable
//! reference through each before, after and on-error hook. Hooks report
//! whether the chain should keep going with a [`Flow`].

use crate::context::Context;
use crate::error::Error;
use crate::internal::Internal;
use std::time::Duration;
use tokio::time::Instant;

/// The triggering payload of an invocation.
pub type Event = serde_json::Value;

/// The value an invocation resolves with.
pub type Response = serde_json::Value;

/// What a hook wants the chain to do next.
///
/// `Respond` short-circuits: the value becomes `request.response` and the
/// remaining hooks of the phase are skipped. A `null` response is still a
/// response.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    /// Run the next hook.
    Continue,
    /// Stop the phase and answer with this value.
    Respond(Response),
}

impl Flow {
    /// Returns `true` if this is `Respond`.
    #[must_use]
    pub const fn is_respond(&self) -> bool {
        matches!(self, Self::Respond(_))
    }
}

/// Result returned by every middleware hook.
pub type MiddlewareResult = Result<Flow, Error>;

/// Mutable state of one invocation.
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use stratum_core::{Context, Internal, Request};
///
/// let mut request = Request::new(json!({"id": 7}), Context::default(), Internal::new());
/// request.event["seen"] = json!(true);
///
/// assert!(request.response.is_none());
/// assert!(request.error.is_none());
/// assert_eq!(request.event["seen"], json!(true));
/// ```
#[derive(Debug)]
pub struct Request {
    /// The triggering payload.
    pub event: Event,

    /// Host metadata for this invocation.
    pub context: Context,

    /// The response, once something produced one.
    pub response: Option<Response>,

    /// The failure being handled, if any.
    pub error: Option<Error>,

    /// Values shared between middlewares for this request.
    pub internal: Internal,

    started_at: Instant,
}

impl Request {
    /// Creates a request with no response and no error.
    #[must_use]
    pub fn new(event: Event, context: Context, internal: Internal) -> Self {
        Self {
            event,
            context,
            response: None,
            error: None,
            internal,
            started_at: Instant::now(),
        }
    }

    /// Returns when the request was created.
    #[must_use]
    pub const fn started_at(&self) -> Instant {
        self.started_at
    }

    /// Returns the time elapsed since the request was created.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Returns `true` if a response has been produced.
    #[must_use]
    pub const fn has_response(&self) -> bool {
        self.response.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_request_is_blank() {
        let request = Request::new(json!({}), Context::default(), Internal::new());
        assert!(!request.has_response());
        assert!(request.error.is_none());
        assert!(request.internal.is_empty());
    }

    #[test]
    fn test_null_response_counts_as_response() {
        let mut request = Request::new(json!({}), Context::default(), Internal::new());
        request.response = Some(Response::Null);
        assert!(request.has_response());
    }

    #[test]
    fn test_flow_is_respond() {
        assert!(Flow::Respond(json!(0)).is_respond());
        assert!(!Flow::Continue.is_respond());
    }

    #[tokio::test(start_paused = true)]
    async fn test_elapsed() {
        let request = Request::new(json!({}), Context::default(), Internal::new());
        tokio::time::advance(Duration::from_millis(25)).await;
        assert_eq!(request.elapsed(), Duration::from_millis(25));
    }
}
