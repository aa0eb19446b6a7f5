//! Key normalization for values exposed to middlewares.

use regex::Regex;
use std::sync::LazyLock;

static LEADING_DIGIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9])").expect("valid regex"));

static NON_ALPHANUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9]+").expect("valid regex"));

/// Turns an arbitrary key into an identifier-safe one.
///
/// A leading digit gets an `_` prefix and every run of non-alphanumeric
/// characters collapses into a single `_`.
///
/// # Example
///
/// ```
/// use stratum_util::sanitize_key;
///
/// assert_eq!(sanitize_key("/dev/db/password"), "_dev_db_password");
/// assert_eq!(sanitize_key("1st-key"), "_1st_key");
/// ```
#[must_use]
pub fn sanitize_key(key: &str) -> String {
    let prefixed = LEADING_DIGIT.replace(key, "_$1");
    NON_ALPHANUMERIC.replace_all(&prefixed, "_").into_owned()
}
