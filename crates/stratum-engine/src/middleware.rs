//! Hooks and middleware descriptors.
//!
//! A [`Hook`] is one async callable that receives the request by mutable
//! reference and returns a [`Flow`](stratum_core::Flow). A [`Middleware`]
//! bundles up to three hooks (before, after, on-error) under one name and is
//! registered with [`Engine::use_middleware`](crate::Engine::use_middleware).
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use stratum_core::Flow;
//! use stratum_engine::Middleware;
//!
//! let normalize = Middleware::new("normalize")
//!     .before(|request| {
//!         Box::pin(async move {
//!             request.event["normalized"] = json!(true);
//!             Ok(Flow::Continue)
//!         })
//!     })
//!     .on_error(|request| {
//!         Box::pin(async move {
//!             let message = request.error.as_ref().map(ToString::to_string);
//!             Ok(Flow::Respond(json!({ "statusCode": 500, "body": message })))
//!         })
//!     });
//!
//! assert!(normalize.has_before());
//! assert!(!normalize.has_after());
//! assert!(normalize.has_on_error());
//! ```

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use stratum_core::{BoxFuture, Error, MiddlewareResult, Request};

/// The shared callable behind a [`Hook`].
pub type HookFn =
    Arc<dyn for<'a> Fn(&'a mut Request) -> BoxFuture<'a, MiddlewareResult> + Send + Sync>;

/// A named before, after or on-error callable.
#[derive(Clone)]
pub struct Hook {
    name: Cow<'static, str>,
    func: HookFn,
}

impl Hook {
    /// Creates a hook. The name is what plugins see in
    /// `before_middleware` / `after_middleware`.
    pub fn new<F>(name: impl Into<Cow<'static, str>>, func: F) -> Self
    where
        F: for<'a> Fn(&'a mut Request) -> BoxFuture<'a, MiddlewareResult> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(func),
        }
    }

    /// Returns the hook name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Runs the hook against a request.
    pub fn call<'a>(&'a self, request: &'a mut Request) -> BoxFuture<'a, MiddlewareResult> {
        (self.func)(request)
    }
}

impl fmt::Debug for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hook").field("name", &self.name).finish()
    }
}

/// A named bundle of optional before, after and on-error hooks.
///
/// A middleware with no hooks at all is rejected at registration time.
#[derive(Clone, Debug)]
pub struct Middleware {
    name: Cow<'static, str>,
    before: Option<Hook>,
    after: Option<Hook>,
    on_error: Option<Hook>,
}

impl Middleware {
    /// Creates an empty middleware. Add at least one hook before registering it.
    #[must_use]
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            before: None,
            after: None,
            on_error: None,
        }
    }

    /// Sets the before hook.
    pub fn before<F>(mut self, func: F) -> Self
    where
        F: for<'a> Fn(&'a mut Request) -> BoxFuture<'a, MiddlewareResult> + Send + Sync + 'static,
    {
        self.before = Some(Hook::new(format!("{}.before", self.name), func));
        self
    }

    /// Sets the after hook.
    pub fn after<F>(mut self, func: F) -> Self
    where
        F: for<'a> Fn(&'a mut Request) -> BoxFuture<'a, MiddlewareResult> + Send + Sync + 'static,
    {
        self.after = Some(Hook::new(format!("{}.after", self.name), func));
        self
    }

    /// Sets the on-error hook.
    pub fn on_error<F>(mut self, func: F) -> Self
    where
        F: for<'a> Fn(&'a mut Request) -> BoxFuture<'a, MiddlewareResult> + Send + Sync + 'static,
    {
        self.on_error = Some(Hook::new(format!("{}.on_error", self.name), func));
        self
    }

    /// Returns the middleware name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns `true` if a before hook is set.
    #[must_use]
    pub const fn has_before(&self) -> bool {
        self.before.is_some()
    }

    /// Returns `true` if an after hook is set.
    #[must_use]
    pub const fn has_after(&self) -> bool {
        self.after.is_some()
    }

    /// Returns `true` if an on-error hook is set.
    #[must_use]
    pub const fn has_on_error(&self) -> bool {
        self.on_error.is_some()
    }

    /// Fails with a configuration error if no hook is set.
    pub fn validate(&self) -> Result<(), Error> {
        if self.before.is_none() && self.after.is_none() && self.on_error.is_none() {
            return Err(Error::configuration(format!(
                "middleware '{}' must provide at least one of before, after, on_error",
                self.name
            )));
        }
        Ok(())
    }

    /// Splits the middleware into its (before, after, on-error) hooks.
    #[must_use]
    pub fn into_hooks(self) -> (Option<Hook>, Option<Hook>, Option<Hook>) {
        (self.before, self.after, self.on_error)
    }
}

/// Conversion into a [`Middleware`] descriptor.
///
/// Reusable middlewares implement this so they can be passed straight to
/// [`Engine::use_middleware`](crate::Engine::use_middleware).
pub trait IntoMiddleware {
    /// Builds the descriptor.
    fn into_middleware(self) -> Middleware;
}

impl IntoMiddleware for Middleware {
    fn into_middleware(self) -> Middleware {
        self
    }
}
