//! # Stratum Core
//!
//! Core types shared by the Stratum middleware engine and its middlewares.
//!
//! - [`Request`] - Per-invocation state threaded through every hook
//! - [`Context`] - Host metadata, including the invocation deadline
//! - [`Flow`] - Continue or short-circuit with a response
//! - [`Error`] - Standard error type
//! - [`Internal`] - Values shared between middlewares within a request
//! - [`AbortSignal`] - Cooperative cancellation handed to the base handler
//! - [`Plugin`] - Lifecycle observer

#![doc(html_root_url = "https://docs.rs/stratum-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod abort;
mod context;
mod error;
pub mod handler;
mod internal;
mod plugin;
mod request;

pub use abort::{AbortController, AbortSignal};
pub use context::{Context, ContextSummary};
pub use error::{Error, ErrorCategory, ErrorDetail, ErrorEnvelope, StratumResult};
pub use handler::{boxed_handler, noop_handler, BoxFuture, BoxedHandler, ErasedHandler};
pub use internal::{Internal, InternalValue, PendingValue};
pub use plugin::{NoopPlugin, Plugin, PluginSet};
pub use request::{Event, Flow, MiddlewareResult, Request, Response};
