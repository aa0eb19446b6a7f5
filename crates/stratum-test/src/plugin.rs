//! A plugin that records every lifecycle call.

use std::sync::Arc;

use parking_lot::Mutex;
use stratum_core::{Plugin, Request};

/// One observed lifecycle call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PluginEvent {
    /// `before_prefetch`
    BeforePrefetch,
    /// `request_start`
    RequestStart,
    /// `before_middleware(name)`
    BeforeMiddleware(String),
    /// `after_middleware(name)`
    AfterMiddleware(String),
    /// `before_handler`
    BeforeHandler,
    /// `after_handler`
    AfterHandler,
    /// `request_end`, with whether the request carried a response and an error.
    RequestEnd {
        /// `request.response.is_some()`
        has_response: bool,
        /// `request.error.is_some()`
        has_error: bool,
    },
}

/// Records lifecycle calls. Clones share the same journal, so keep one
/// clone for assertions and hand another to the engine.
#[derive(Debug, Clone, Default)]
pub struct CountingPlugin {
    events: Arc<Mutex<Vec<PluginEvent>>>,
}

impl CountingPlugin {
    /// Creates a plugin with an empty journal.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every recorded call, in order.
    #[must_use]
    pub fn events(&self) -> Vec<PluginEvent> {
        self.events.lock().clone()
    }

    /// Returns how many recorded calls match `predicate`.
    pub fn count(&self, predicate: impl Fn(&PluginEvent) -> bool) -> usize {
        self.events.lock().iter().filter(|e| predicate(e)).count()
    }

    /// Returns how many times `request_end` was called.
    #[must_use]
    pub fn request_ends(&self) -> usize {
        self.count(|e| matches!(e, PluginEvent::RequestEnd { .. }))
    }

    /// Returns the names passed to `before_middleware`, in order.
    #[must_use]
    pub fn middleware_names(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                PluginEvent::BeforeMiddleware(name) => Some(name.clone()),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: PluginEvent) {
        self.events.lock().push(event);
    }
}

impl Plugin for CountingPlugin {
    fn before_prefetch(&self) {
        self.push(PluginEvent::BeforePrefetch);
    }

    fn request_start(&self) {
        self.push(PluginEvent::RequestStart);
    }

    fn before_middleware(&self, name: &str) {
        self.push(PluginEvent::BeforeMiddleware(name.to_string()));
    }

    fn after_middleware(&self, name: &str) {
        self.push(PluginEvent::AfterMiddleware(name.to_string()));
    }

    fn before_handler(&self) {
        self.push(PluginEvent::BeforeHandler);
    }

    fn after_handler(&self) {
        self.push(PluginEvent::AfterHandler);
    }

    fn request_end(&self, request: &Request) {
        self.push(PluginEvent::RequestEnd {
            has_response: request.response.is_some(),
            has_error: request.error.is_some(),
        });
    }
}
