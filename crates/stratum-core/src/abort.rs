//! Cooperative cancellation for base handlers.
//!
//! The deadline guard owns an [`AbortController`] per invocation and hands
//! the matching [`AbortSignal`] to the handler. Aborting never interrupts the
//! handler by force: it flips a flag and wakes anything awaiting
//! [`AbortSignal::aborted`], and the handler decides how to stop.
//!
//! # Example
//!
//! ```rust
//! use stratum_core::AbortController;
//!
//! let controller = AbortController::new();
//! let signal = controller.signal();
//!
//! controller.abort();
//! assert!(signal.is_aborted());
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;

#[derive(Debug, Default)]
struct AbortState {
    aborted: AtomicBool,
    notify: Notify,
}

/// The owning side of an abort signal.
#[derive(Debug, Clone, Default)]
pub struct AbortController {
    state: Arc<AbortState>,
}

impl AbortController {
    /// Creates a controller whose signal is not yet aborted.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a signal observing this controller.
    #[must_use]
    pub fn signal(&self) -> AbortSignal {
        AbortSignal {
            state: Arc::clone(&self.state),
        }
    }

    /// Aborts the signal. Idempotent.
    pub fn abort(&self) {
        if self
            .state
            .aborted
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            self.state.notify.notify_waiters();
        }
    }
}

/// Read side of an [`AbortController`], passed to the base handler by value.
#[derive(Debug, Clone)]
pub struct AbortSignal {
    state: Arc<AbortState>,
}

impl AbortSignal {
    /// Returns a signal that can never be aborted.
    #[must_use]
    pub fn never() -> Self {
        AbortController::new().signal()
    }

    /// Returns `true` once the controller has aborted.
    #[must_use]
    pub fn is_aborted(&self) -> bool {
        self.state.aborted.load(Ordering::SeqCst)
    }

    /// Completes when the signal is aborted, immediately if it already was.
    pub async fn aborted(&self) {
        loop {
            // Register before checking the flag so an abort in between is not lost.
            let notified = self.state.notify.notified();
            if self.is_aborted() {
                return;
            }
            notified.await;
        }
    }
}
