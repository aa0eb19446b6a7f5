//! Canned hooks and handlers.

use std::time::Duration;

use stratum_core::{
    AbortSignal, BoxFuture, Context, Error, Event, Flow, MiddlewareResult, Request, Response,
};

/// A hook that always continues.
pub fn continuing(
) -> impl for<'a> Fn(&'a mut Request) -> BoxFuture<'a, MiddlewareResult> + Send + Sync + 'static {
    |_request| Box::pin(async { Ok(Flow::Continue) })
}

/// A hook that always responds with `response`.
pub fn responding(
    response: Response,
) -> impl for<'a> Fn(&'a mut Request) -> BoxFuture<'a, MiddlewareResult> + Send + Sync + 'static {
    move |_request| {
        let response = response.clone();
        Box::pin(async move { Ok(Flow::Respond(response)) })
    }
}

/// A hook that always fails with a handler error carrying `message`.
pub fn failing(
    message: &str,
) -> impl for<'a> Fn(&'a mut Request) -> BoxFuture<'a, MiddlewareResult> + Send + Sync + 'static {
    let message = message.to_string();
    move |_request| {
        let message = message.clone();
        Box::pin(async move { Err(Error::handler(message)) })
    }
}

/// A base handler that sleeps for `delay` and then resolves `response`.
pub fn sleeping_handler(
    delay: Duration,
    response: Response,
) -> impl Fn(Event, Context, AbortSignal) -> BoxFuture<'static, Result<Response, Error>>
       + Send
       + Sync
       + 'static {
    move |_event, _context, _signal| {
        let response = response.clone();
        Box::pin(async move {
            tokio::time::sleep(delay).await;
            Ok(response)
        })
    }
}
