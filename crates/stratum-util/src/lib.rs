//! # Stratum Util
//!
//! Helpers shared by middlewares built on the Stratum engine.
//!
//! - [`get_internal`] - Pull named values (awaiting pending ones) out of `request.internal`
//! - [`Cache`] - Owned fetch cache with an injected [`Clock`]
//! - [`sanitize_key`] - Identifier-safe keys
//! - [`json_safe_parse`] - Parse JSON or keep the raw string
//! - [`can_prefetch`] - Whether a fetch may run before the first invocation

#![doc(html_root_url = "https://docs.rs/stratum-util/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod cache;
mod internal;
mod json;
mod key;
mod prefetch;

pub use cache::{Cache, CacheEntry, CacheOptions, Clock, ManualClock, SystemClock};
pub use internal::{get_internal, InternalSelector};
pub use json::json_safe_parse;
pub use key::sanitize_key;
pub use prefetch::{can_prefetch, PrefetchOptions};
