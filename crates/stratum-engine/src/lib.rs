//! # Stratum Engine
//!
//! Request lifecycle engine for function-as-a-service handlers.
//!
//! An [`Engine`] wraps a base handler with three hook chains and runs every
//! invocation through them:
//!
//! ```text
//! event ─► before (A → B → C) ─► handler ─► after (C → B → A) ─► response
//!              │                   │            │
//!              └───────────────────┴────────────┴─► on_error (C → B → A)
//! ```
//!
//! | Phase    | Order                | Short-circuit                          |
//! |----------|----------------------|----------------------------------------|
//! | before   | registration         | skips the rest, handler and after      |
//! | handler  | raced with deadline  | -                                      |
//! | after    | reverse registration | skips the rest of the after chain      |
//! | on_error | reverse registration | recovers the invocation                |
//!
//! A hook returns [`Flow::Continue`](stratum_core::Flow::Continue) to let the
//! chain proceed or [`Flow::Respond`](stratum_core::Flow::Respond) to produce
//! the response. Any failure abandons the current phase and runs the on-error
//! chain.
//!
//! ## Example
//!
//! ```
//! use serde_json::json;
//! use stratum_core::{Context, Error, Flow};
//! use stratum_engine::{Engine, EngineConfig, Middleware};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let engine = Engine::with_config(
//!     |_event, _context, _signal| async { Err(Error::handler("upstream unavailable")) },
//!     EngineConfig::default().timeout_early_in_millis(50),
//! );
//!
//! engine
//!     .use_middleware(Middleware::new("error-handler").on_error(|request| {
//!         Box::pin(async move {
//!             let message = request.error.as_ref().map(ToString::to_string);
//!             Ok(Flow::Respond(json!({ "statusCode": 500, "body": message })))
//!         })
//!     }))
//!     .unwrap();
//!
//! let response = engine.invoke(json!({}), Context::default()).await.unwrap();
//! assert_eq!(response["statusCode"], 500);
//! # }
//! ```

#![doc(html_root_url = "https://docs.rs/stratum-engine/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod chain;
pub mod config;
pub mod deadline;
mod engine;
pub mod middleware;
mod runner;

pub use chain::{ChainSnapshot, Chains, Phase};
pub use config::{EngineConfig, TimeoutResponse, DEFAULT_TIMEOUT_EARLY_IN_MILLIS};
pub use deadline::handler_budget;
pub use engine::Engine;
pub use middleware::{Hook, HookFn, IntoMiddleware, Middleware};
