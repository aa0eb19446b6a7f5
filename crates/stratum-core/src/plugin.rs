//! Instrumentation plugin hooks.
//!
//! A [`Plugin`] observes the request lifecycle at fixed points. Every hook
//! has an empty default body, so implementors only override what they need.
//! Plugins have no control-flow authority: return values are not consulted
//! and the engine never branches on anything a plugin does.
//!
//! Call order for an invocation that runs everything:
//!
//! ```text
//! request_start
//!   before_middleware(name) / after_middleware(name)   per before hook
//!   before_handler
//!   after_handler
//!   before_middleware(name) / after_middleware(name)   per after hook
//! request_end(request)                                 always, exactly once
//! ```
//!
//! `before_prefetch` fires once, when the engine is constructed.

use crate::request::Request;
use std::sync::Arc;

/// Lifecycle observer.
pub trait Plugin: Send + Sync + 'static {
    /// Called once when the engine is constructed.
    fn before_prefetch(&self) {}

    /// Called when an invocation begins.
    fn request_start(&self) {}

    /// Called before each executed hook.
    fn before_middleware(&self, _name: &str) {}

    /// Called after each hook that returned without failing.
    fn after_middleware(&self, _name: &str) {}

    /// Called right before the base handler runs.
    fn before_handler(&self) {}

    /// Called after the base handler settled successfully.
    fn after_handler(&self) {}

    /// Called once per invocation on every exit path.
    fn request_end(&self, _request: &Request) {}
}

/// A plugin that observes nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopPlugin;

impl Plugin for NoopPlugin {}

/// Fans every hook out to several plugins, in order.
#[derive(Clone, Default)]
pub struct PluginSet {
    plugins: Vec<Arc<dyn Plugin>>,
}

impl PluginSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a plugin to the end of the set.
    #[must_use]
    pub fn with(mut self, plugin: impl Plugin) -> Self {
        self.plugins.push(Arc::new(plugin));
        self
    }

    /// Returns the number of plugins.
    #[must_use]
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    /// Returns `true` if the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

impl std::fmt::Debug for PluginSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginSet")
            .field("plugins", &self.plugins.len())
            .finish()
    }
}

impl Plugin for PluginSet {
    fn before_prefetch(&self) {
        self.plugins.iter().for_each(|p| p.before_prefetch());
    }

    fn request_start(&self) {
        self.plugins.iter().for_each(|p| p.request_start());
    }

    fn before_middleware(&self, name: &str) {
        self.plugins.iter().for_each(|p| p.before_middleware(name));
    }

    fn after_middleware(&self, name: &str) {
        self.plugins.iter().for_each(|p| p.after_middleware(name));
    }

    fn before_handler(&self) {
        self.plugins.iter().for_each(|p| p.before_handler());
    }

    fn after_handler(&self) {
        self.plugins.iter().for_each(|p| p.after_handler());
    }

    fn request_end(&self, request: &Request) {
        self.plugins.iter().for_each(|p| p.request_end(request));
    }
}
