//! Registered hook chains and per-invocation snapshots.
//!
//! Hooks are stored in registration order. A [`ChainSnapshot`] is taken at
//! the start of every invocation and fixes the execution order:
//!
//! ```text
//! registered:  A, B, C
//! before:      A -> B -> C
//! handler
//! after:       C -> B -> A
//! on_error:    C -> B -> A
//! ```
//!
//! Registrations made while an invocation is in flight only affect
//! invocations that start afterwards.

use crate::middleware::{Hook, Middleware};

/// The three hook chains an invocation walks through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Runs before the handler, in registration order.
    Before,
    /// Runs after the handler, in reverse registration order.
    After,
    /// Runs when anything fails, in reverse registration order.
    OnError,
}

impl Phase {
    /// Returns the phase name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Before => "before",
            Self::After => "after",
            Self::OnError => "on_error",
        }
    }

    /// Returns all phases in the order a successful invocation visits them.
    #[must_use]
    pub const fn all() -> [Phase; 3] {
        [Self::Before, Self::After, Self::OnError]
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Hooks in registration order.
#[derive(Debug, Clone, Default)]
pub struct Chains {
    before: Vec<Hook>,
    after: Vec<Hook>,
    on_error: Vec<Hook>,
}

impl Chains {
    /// Creates empty chains.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a hook to one chain.
    pub fn push(&mut self, phase: Phase, hook: Hook) {
        match phase {
            Phase::Before => self.before.push(hook),
            Phase::After => self.after.push(hook),
            Phase::OnError => self.on_error.push(hook),
        }
    }

    /// Appends each hook the middleware carries to its chain.
    ///
    /// Callers validate the middleware first.
    pub fn register(&mut self, middleware: Middleware) {
        let (before, after, on_error) = middleware.into_hooks();
        if let Some(hook) = before {
            self.before.push(hook);
        }
        if let Some(hook) = after {
            self.after.push(hook);
        }
        if let Some(hook) = on_error {
            self.on_error.push(hook);
        }
    }

    /// Returns the number of hooks registered in a chain.
    #[must_use]
    pub fn len(&self, phase: Phase) -> usize {
        match phase {
            Phase::Before => self.before.len(),
            Phase::After => self.after.len(),
            Phase::OnError => self.on_error.len(),
        }
    }

    /// Returns `true` if no hook is registered in any chain.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.before.is_empty() && self.after.is_empty() && self.on_error.is_empty()
    }

    /// Copies the chains in execution order.
    #[must_use]
    pub fn snapshot(&self) -> ChainSnapshot {
        ChainSnapshot {
            before: self.before.clone(),
            after: self.after.iter().rev().cloned().collect(),
            on_error: self.on_error.iter().rev().cloned().collect(),
        }
    }
}

/// Hooks fixed for one invocation, in execution order.
#[derive(Debug, Clone, Default)]
pub struct ChainSnapshot {
    before: Vec<Hook>,
    after: Vec<Hook>,
    on_error: Vec<Hook>,
}

impl ChainSnapshot {
    /// Returns one chain in the order it runs.
    #[must_use]
    pub fn hooks(&self, phase: Phase) -> &[Hook] {
        match phase {
            Phase::Before => &self.before,
            Phase::After => &self.after,
            Phase::OnError => &self.on_error,
        }
    }

    /// Returns the hook names of one chain in the order they run.
    #[must_use]
    pub fn names(&self, phase: Phase) -> Vec<&str> {
        self.hooks(phase).iter().map(Hook::name).collect()
    }
}
