//! The engine: registration API and invocable entry point.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::Instrument;

use stratum_core::{
    boxed_handler, noop_handler, AbortSignal, BoxFuture, BoxedHandler, Context, Error, Event,
    MiddlewareResult, Request, Response,
};

use crate::chain::{ChainSnapshot, Chains, Phase};
use crate::config::EngineConfig;
use crate::middleware::{Hook, IntoMiddleware, Middleware};
use crate::runner;

struct EngineInner {
    handler: RwLock<BoxedHandler>,
    chains: RwLock<Chains>,
    config: EngineConfig,
}

/// A wrapped base handler with before, after and on-error chains.
///
/// Cloning is cheap and every clone shares the same registrations. Register
/// middleware at setup time, then call [`invoke`](Self::invoke) once per
/// incoming event. Each invocation works on a snapshot of the chains taken
/// when it starts.
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use stratum_core::{Context, Flow};
/// use stratum_engine::{Engine, Middleware};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let engine = Engine::new(|event, _context, _signal| async move {
///     Ok(json!({ "echo": event }))
/// });
///
/// engine
///     .use_middleware(Middleware::new("wrap").after(|request| {
///         Box::pin(async move {
///             if let Some(response) = request.response.as_mut() {
///                 response["wrapped"] = json!(true);
///             }
///             Ok(Flow::Continue)
///         })
///     }))
///     .unwrap();
///
/// let response = engine.invoke(json!("hi"), Context::default()).await.unwrap();
/// assert_eq!(response, json!({ "echo": "hi", "wrapped": true }));
/// # }
/// ```
#[derive(Clone)]
pub struct Engine {
    inner: Arc<EngineInner>,
}

impl Engine {
    /// Wraps a base handler with the default configuration.
    pub fn new<F, Fut>(handler: F) -> Self
    where
        F: Fn(Event, Context, AbortSignal) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response, Error>> + Send + 'static,
    {
        Self::with_config(handler, EngineConfig::default())
    }

    /// Wraps a base handler with the given configuration.
    pub fn with_config<F, Fut>(handler: F, config: EngineConfig) -> Self
    where
        F: Fn(Event, Context, AbortSignal) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response, Error>> + Send + 'static,
    {
        Self::build(boxed_handler(handler), config)
    }

    /// Builds an engine with no base handler yet. The placeholder resolves
    /// `null`; replace it with [`handler`](Self::handler).
    pub fn from_config(config: EngineConfig) -> Self {
        Self::build(noop_handler(), config)
    }

    fn build(handler: BoxedHandler, config: EngineConfig) -> Self {
        config.observer().before_prefetch();
        tracing::debug!(
            timeout_early_in_millis = config.timeout_early(),
            "engine constructed"
        );

        Self {
            inner: Arc::new(EngineInner {
                handler: RwLock::new(handler),
                chains: RwLock::new(Chains::new()),
                config,
            }),
        }
    }

    /// Registers a middleware descriptor.
    ///
    /// Fails with [`Error::Configuration`] if the descriptor has no hooks.
    pub fn use_middleware(&self, middleware: impl IntoMiddleware) -> Result<&Self, Error> {
        let middleware = middleware.into_middleware();
        middleware.validate()?;

        tracing::debug!(middleware = middleware.name(), "registering middleware");
        self.inner.chains.write().register(middleware);
        Ok(self)
    }

    /// Registers an ordered list of middleware descriptors.
    ///
    /// Every descriptor is validated first, so a failing list registers
    /// nothing.
    pub fn use_middlewares<I>(&self, middlewares: I) -> Result<&Self, Error>
    where
        I: IntoIterator,
        I::Item: IntoMiddleware,
    {
        let middlewares: Vec<Middleware> = middlewares
            .into_iter()
            .map(IntoMiddleware::into_middleware)
            .collect();
        for middleware in &middlewares {
            middleware.validate()?;
        }

        let mut chains = self.inner.chains.write();
        for middleware in middlewares {
            tracing::debug!(middleware = middleware.name(), "registering middleware");
            chains.register(middleware);
        }
        Ok(self)
    }

    /// Appends a single before hook.
    pub fn before<F>(&self, hook: F) -> &Self
    where
        F: for<'a> Fn(&'a mut Request) -> BoxFuture<'a, MiddlewareResult> + Send + Sync + 'static,
    {
        self.push_anonymous(Phase::Before, hook)
    }

    /// Appends a single after hook.
    pub fn after<F>(&self, hook: F) -> &Self
    where
        F: for<'a> Fn(&'a mut Request) -> BoxFuture<'a, MiddlewareResult> + Send + Sync + 'static,
    {
        self.push_anonymous(Phase::After, hook)
    }

    /// Appends a single on-error hook.
    pub fn on_error<F>(&self, hook: F) -> &Self
    where
        F: for<'a> Fn(&'a mut Request) -> BoxFuture<'a, MiddlewareResult> + Send + Sync + 'static,
    {
        self.push_anonymous(Phase::OnError, hook)
    }

    /// Names a bare hook after its phase and position, e.g. `before#2`.
    fn push_anonymous<F>(&self, phase: Phase, hook: F) -> &Self
    where
        F: for<'a> Fn(&'a mut Request) -> BoxFuture<'a, MiddlewareResult> + Send + Sync + 'static,
    {
        let mut chains = self.inner.chains.write();
        let name = format!("{phase}#{}", chains.len(phase) + 1);
        chains.push(phase, Hook::new(name, hook));
        drop(chains);
        self
    }

    /// Appends an already named hook to one chain.
    pub fn push(&self, phase: Phase, hook: Hook) -> &Self {
        self.inner.chains.write().push(phase, hook);
        self
    }

    /// Replaces the base handler. Invocations already running keep the old one.
    pub fn handler<F, Fut>(&self, handler: F) -> &Self
    where
        F: Fn(Event, Context, AbortSignal) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response, Error>> + Send + 'static,
    {
        *self.inner.handler.write() = boxed_handler(handler);
        self
    }

    /// Returns the configuration the engine was built with.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    /// Returns the number of hooks registered in one chain.
    #[must_use]
    pub fn hook_count(&self, phase: Phase) -> usize {
        self.inner.chains.read().len(phase)
    }

    /// Returns the hooks of every chain, in execution order, as the next
    /// invocation would see them.
    #[must_use]
    pub fn snapshot(&self) -> ChainSnapshot {
        self.inner.chains.read().snapshot()
    }

    fn current_handler(&self) -> BoxedHandler {
        self.inner.handler.read().clone()
    }

    /// Runs one invocation.
    ///
    /// Resolves with the final response on success or recovery, and fails
    /// with the effective error otherwise.
    pub async fn invoke(&self, event: Event, context: Context) -> Result<Response, Error> {
        let chains = self.snapshot();
        let handler = self.current_handler();
        let config = &self.inner.config;

        let span = tracing::debug_span!(
            "invocation",
            request_id = %context.request_id,
            function = %context.function_name,
        );

        async move {
            config.observer().request_start();
            let request = Request::new(event, context, config.initial_internal().clone());
            runner::run_request(request, &chains, handler.as_ref(), config).await
        }
        .instrument(span)
        .await
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let chains = self.inner.chains.read();
        f.debug_struct("Engine")
            .field("before", &chains.len(Phase::Before))
            .field("after", &chains.len(Phase::After))
            .field("on_error", &chains.len(Phase::OnError))
            .field("config", &self.inner.config)
            .finish()
    }
}
