//! Deadline guard around the base handler.
//!
//! When the context carries a deadline and the margin is positive, the
//! handler races a timer set to fire `margin` milliseconds before the
//! deadline. The first to settle decides the outcome. If the timer wins, the
//! handler's [`AbortSignal`](stratum_core::AbortSignal) is triggered and its
//! future is dropped.

use std::time::Duration;

use stratum_core::{AbortController, Context, ErasedHandler, Error, Event, Response};

use crate::config::EngineConfig;

/// Returns how long the handler may run, or `None` when no race is needed.
///
/// `None` when the margin is zero or negative, or when there is no deadline.
/// A deadline already inside the margin yields a zero budget.
#[must_use]
pub fn handler_budget(remaining_millis: Option<i64>, margin_millis: i64) -> Option<Duration> {
    if margin_millis <= 0 {
        return None;
    }
    let remaining = remaining_millis?;
    let budget = remaining.saturating_sub(margin_millis).max(0);
    Some(Duration::from_millis(budget.unsigned_abs()))
}

/// Runs the handler, racing it against the deadline when one applies.
pub(crate) async fn run_guarded(
    handler: &dyn ErasedHandler,
    event: Event,
    context: Context,
    config: &EngineConfig,
) -> Result<Response, Error> {
    let budget = handler_budget(context.remaining_time_in_millis(), config.timeout_early());
    let controller = AbortController::new();
    let handler_future = handler.call(event, context, controller.signal());

    let Some(budget) = budget else {
        return handler_future.await;
    };

    tokio::select! {
        biased;
        result = handler_future => result,
        () = tokio::time::sleep(budget) => {
            tracing::warn!(
                budget_ms = budget.as_millis() as u64,
                "handler did not settle before the deadline margin"
            );
            controller.abort();
            config.early_response()
        }
    }
}
