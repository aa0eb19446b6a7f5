//! # Stratum
//!
//! **Middleware engine for function-as-a-service handlers**
//!
//! Stratum wraps a single async handler with ordered chains of middleware:
//!
//! - **before** hooks run in registration order and may answer early
//! - **after** hooks run in reverse order and may replace the response
//! - **on_error** hooks run in reverse order and may recover a failure
//! - a deadline guard abandons the handler shortly before the platform
//!   deadline and answers with a timeout instead
//!
//! ## Quick Start
//!
//! ```
//! use stratum::prelude::*;
//! use serde_json::json;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Error> {
//! let engine = Engine::new(|event: Event, _context, _signal| async move {
//!     Ok(json!({ "statusCode": 200, "body": event["name"] }))
//! });
//!
//! engine.use_middleware(Middleware::new("default-name").before(|request| {
//!     Box::pin(async move {
//!         if request.event.get("name").is_none() {
//!             request.event["name"] = json!("world");
//!         }
//!         Ok(Flow::Continue)
//!     })
//! }))?;
//!
//! let response = engine.invoke(json!({}), Context::default()).await?;
//! assert_eq!(response["body"], "world");
//! # Ok(())
//! # }
//! ```
//!
//! ## Crates
//!
//! | Module        | Crate               | Contents                                   |
//! |---------------|---------------------|--------------------------------------------|
//! | [`core`]      | `stratum-core`      | request, context, errors, plugin hooks     |
//! | [`engine`]    | `stratum-engine`    | chains, middleware, deadline guard         |
//! | [`util`]      | `stratum-util`      | internal-store lookup, fetch cache, JSON   |
//! | [`telemetry`] | `stratum-telemetry` | logging, Prometheus metrics, tracing plugin|
//! | [`config`]    | `stratum-config`    | TOML/JSON/env configuration                |

#![doc(html_root_url = "https://docs.rs/stratum/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export core types
pub use stratum_core as core;

// Re-export the engine
pub use stratum_engine as engine;

// Re-export middleware helpers
pub use stratum_util as util;

// Re-export observability
pub use stratum_telemetry as telemetry;

// Re-export configuration
pub use stratum_config as config;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```
/// use stratum::prelude::*;
///
/// let engine = Engine::from_config(EngineConfig::default().timeout_early_in_millis(0));
/// assert_eq!(engine.hook_count(Phase::Before), 0);
/// ```
pub mod prelude {
    pub use stratum_core::{
        AbortSignal, Context, Error, Event, Flow, MiddlewareResult, Plugin, PluginSet, Request,
        Response, StratumResult,
    };

    pub use stratum_engine::{Engine, EngineConfig, IntoMiddleware, Middleware, Phase};

    pub use stratum_config::{ConfigLoader, StratumConfig};

    pub use stratum_telemetry::{init_telemetry, TracingPlugin};
}
