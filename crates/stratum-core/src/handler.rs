//! Base handler trait and type erasure.
//!
//! The engine stores exactly one base handler and must be able to swap it at
//! runtime, so handlers are kept as `Arc<dyn ErasedHandler>`. Any async
//! function with the signature below is accepted:
//!
//! ```text
//! async fn handler(event: Event, context: Context, signal: AbortSignal)
//!     -> Result<Response, Error>
//! ```
//!
//! `event` and `context` are copies of the request's values at the moment the
//! handler starts, so before-middleware mutations are visible to it.

use crate::abort::AbortSignal;
use crate::context::Context;
use crate::error::Error;
use crate::request::{Event, Response};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// A boxed, sendable future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Object-safe dispatch interface for base handlers.
pub trait ErasedHandler: Send + Sync + 'static {
    /// Runs the handler for one invocation.
    fn call(
        &self,
        event: Event,
        context: Context,
        signal: AbortSignal,
    ) -> BoxFuture<'static, Result<Response, Error>>;
}

/// A shared, type-erased base handler.
pub type BoxedHandler = Arc<dyn ErasedHandler>;

/// Wraps an async function as an [`ErasedHandler`].
pub struct FnHandler<F>(F);

impl<F> FnHandler<F> {
    /// Creates a new function-based handler.
    pub const fn new(func: F) -> Self {
        Self(func)
    }
}

impl<F, Fut> ErasedHandler for FnHandler<F>
where
    F: Fn(Event, Context, AbortSignal) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response, Error>> + Send + 'static,
{
    fn call(
        &self,
        event: Event,
        context: Context,
        signal: AbortSignal,
    ) -> BoxFuture<'static, Result<Response, Error>> {
        Box::pin((self.0)(event, context, signal))
    }
}

/// Boxes an async function into a [`BoxedHandler`].
pub fn boxed_handler<F, Fut>(func: F) -> BoxedHandler
where
    F: Fn(Event, Context, AbortSignal) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response, Error>> + Send + 'static,
{
    Arc::new(FnHandler::new(func))
}

/// The handler used when an engine is built without one. Resolves `null`.
pub fn noop_handler() -> BoxedHandler {
    boxed_handler(|_event, _context, _signal| async { Ok(Response::Null) })
}
