//! Typed configuration for Stratum functions.
//!
//! - TOML and JSON configuration files
//! - `.env` files and environment variable overrides
//! - Strict validation (fails on unknown fields)
//! - Layered configuration (defaults → file → env)
//!
//! # Example
//!
//! ```no_run
//! use stratum_config::ConfigLoader;
//!
//! # fn main() -> Result<(), stratum_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_optional_file("stratum.toml")?
//!     .with_env_prefix("STRATUM")
//!     .load()?;
//!
//! println!("deadline margin: {}ms", config.engine.timeout_early_in_millis);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration File Format
//!
//! ```toml
//! [engine]
//! timeout_early_in_millis = 5
//!
//! [logging]
//! enabled = true
//! level = "info"
//! format = "json"
//! ansi_enabled = false
//!
//! [metrics]
//! enabled = true
//! ```
//!
//! # Environment Variable Overrides
//!
//! - `STRATUM__ENGINE__TIMEOUT_EARLY_IN_MILLIS=100`
//! - `STRATUM__LOGGING__LEVEL=debug`
//! - `STRATUM__LOGGING__FORMAT=pretty`
//! - `STRATUM__METRICS__ENABLED=false`

#![warn(missing_docs)]

mod config;
mod error;
mod loader;

pub use config::*;
pub use error::ConfigError;
pub use loader::ConfigLoader;
