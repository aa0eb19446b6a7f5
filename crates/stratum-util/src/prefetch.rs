//! Prefetch eligibility.
//!
//! A middleware may start fetching a remote value when the engine is
//! built, before the first invocation arrives, and park the pending value in
//! the engine's initial [`Internal`](stratum_core::Internal). That is only
//! safe when the fetch does not depend on anything per-invocation.

/// Options that decide whether a fetch may happen ahead of time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrefetchOptions {
    /// Role to assume before fetching. Credentials come from the request, so
    /// an assumed role rules out prefetching.
    pub assume_role: Option<String>,
    /// Explicit opt-out.
    pub disable_prefetch: bool,
}

/// Returns `true` if a fetch with these options may run at construction time.
#[must_use]
pub fn can_prefetch(options: Option<&PrefetchOptions>) -> bool {
    options.map_or(true, |o| o.assume_role.is_none() && !o.disable_prefetch)
}
