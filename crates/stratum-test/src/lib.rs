//! # Stratum Test
//!
//! Test utilities for code built on the Stratum engine.
//!
//! - [`TestContext`] - Build a [`Context`](stratum_core::Context) with a deadline
//! - [`CallLog`] and [`recording`] - Assert the order hooks ran in
//! - [`continuing`], [`responding`], [`failing`], [`sleeping_handler`] - Canned hooks
//! - [`CountingPlugin`] - Journal of lifecycle calls
//!
//! ## Example
//!
//! ```
//! use serde_json::json;
//! use stratum_engine::{Engine, EngineConfig};
//! use stratum_test::{recording, CallLog, CountingPlugin, TestContext};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let log = CallLog::new();
//! let plugin = CountingPlugin::new();
//! let engine = Engine::with_config(
//!     |event, _, _| async move { Ok(event) },
//!     EngineConfig::default().plugin(plugin.clone()),
//! );
//! engine
//!     .use_middlewares([recording("a", &log), recording("b", &log)])
//!     .unwrap();
//!
//! engine.invoke(json!(1), TestContext::new().build()).await.unwrap();
//!
//! assert_eq!(log.entries(), vec!["a.before", "b.before", "b.after", "a.after"]);
//! assert_eq!(plugin.request_ends(), 1);
//! # }
//! ```

#![doc(html_root_url = "https://docs.rs/stratum-test/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod context;
mod hooks;
mod plugin;
mod recorder;

pub use context::TestContext;
pub use hooks::{continuing, failing, responding, sleeping_handler};
pub use plugin::{CountingPlugin, PluginEvent};
pub use recorder::{record, recording, CallLog};
