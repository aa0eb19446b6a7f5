//! The per-invocation state machine.
//!
//! ```text
//! BEFORE ──► HANDLER ──► AFTER ──► DONE
//!    │          │          │
//!    └──────────┴──────────┴──► ERROR ──► ON_ERROR ──► DONE | FAILED
//! ```
//!
//! `request_end` runs once on every exit path before the outcome is returned.

use stratum_core::{ErasedHandler, Error, Flow, Plugin, Request, Response};

use crate::chain::{ChainSnapshot, Phase};
use crate::config::EngineConfig;
use crate::deadline;
use crate::middleware::Hook;

/// How an invocation settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    /// Resolve with `request.response`.
    Responded,
    /// Reject with `request.error`.
    Failed,
}

/// Drives one request through the snapshot chains and the handler.
pub(crate) async fn run_request(
    mut request: Request,
    chains: &ChainSnapshot,
    handler: &dyn ErasedHandler,
    config: &EngineConfig,
) -> Result<Response, Error> {
    let plugin = config.observer();

    let outcome = match run_main(&mut request, chains, handler, config).await {
        Ok(()) => Outcome::Responded,
        Err(error) => recover(&mut request, chains, plugin, error).await,
    };

    settle(&mut request, outcome);
    plugin.request_end(&request);

    tracing::debug!(
        outcome = ?outcome,
        elapsed_ms = request.elapsed().as_millis() as u64,
        "invocation finished"
    );

    match outcome {
        Outcome::Responded => Ok(request.response.take().unwrap_or_default()),
        Outcome::Failed => Err(request
            .error
            .take()
            .unwrap_or_else(|| Error::handler(CLEARED_ERROR))),
    }
}

const CLEARED_ERROR: &str = "invocation failed and the error was cleared";

/// Makes the request agree with the outcome before observers see it.
fn settle(request: &mut Request, outcome: Outcome) {
    match outcome {
        Outcome::Responded => {
            request.response.get_or_insert(Response::Null);
        }
        Outcome::Failed => {
            request.response = None;
            request
                .error
                .get_or_insert_with(|| Error::handler(CLEARED_ERROR));
        }
    }
}

async fn run_main(
    request: &mut Request,
    chains: &ChainSnapshot,
    handler: &dyn ErasedHandler,
    config: &EngineConfig,
) -> Result<(), Error> {
    let plugin = config.observer();

    run_chain(request, chains.hooks(Phase::Before), Phase::Before, plugin).await?;
    if request.response.is_some() {
        tracing::debug!("before chain produced a response; skipping handler");
        return Ok(());
    }

    plugin.before_handler();
    let response = deadline::run_guarded(
        handler,
        request.event.clone(),
        request.context.clone(),
        config,
    )
    .await?;
    request.response = Some(response);
    plugin.after_handler();

    run_chain(request, chains.hooks(Phase::After), Phase::After, plugin).await
}

/// Runs hooks in order until one fails or responds.
async fn run_chain(
    request: &mut Request,
    hooks: &[Hook],
    phase: Phase,
    plugin: &dyn Plugin,
) -> Result<(), Error> {
    tracing::debug!(phase = phase.name(), hooks = hooks.len(), "running chain");

    for hook in hooks {
        plugin.before_middleware(hook.name());
        tracing::trace!(phase = phase.name(), hook = hook.name(), "running hook");

        let flow = hook.call(request).await?;
        plugin.after_middleware(hook.name());

        if let Flow::Respond(response) = flow {
            tracing::debug!(phase = phase.name(), hook = hook.name(), "hook responded");
            request.response = Some(response);
            return Ok(());
        }
    }

    Ok(())
}

/// Routes a failure through the on-error chain.
async fn recover(
    request: &mut Request,
    chains: &ChainSnapshot,
    plugin: &dyn Plugin,
    error: Error,
) -> Outcome {
    tracing::debug!(
        error = %error,
        category = error.category().as_str(),
        "invocation failed; running on_error chain"
    );

    request.response = None;
    request.error = Some(error);

    if let Err(secondary) =
        run_chain(request, chains.hooks(Phase::OnError), Phase::OnError, plugin).await
    {
        let secondary = match request.error.take() {
            Some(original) => secondary.caused_by(original),
            None => secondary,
        };
        tracing::warn!(error = %secondary, "on_error hook failed");
        request.error = Some(secondary);
        return Outcome::Failed;
    }

    if request.response.is_some() {
        tracing::debug!("error recovered by on_error chain");
        Outcome::Responded
    } else {
        if let Some(error) = &request.error {
            tracing::warn!(
                error = %error,
                category = error.category().as_str(),
                "unrecovered error"
            );
        }
        Outcome::Failed
    }
}
