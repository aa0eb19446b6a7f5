//! Lenient JSON helpers.

use serde_json::Value;

/// Parses `input` as JSON, falling back to the raw string.
///
/// Useful for payload fields that are usually JSON but may be plain text.
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use stratum_util::json_safe_parse;
///
/// assert_eq!(json_safe_parse(r#"{"a":1}"#), json!({"a": 1}));
/// assert_eq!(json_safe_parse("not json"), json!("not json"));
/// ```
#[must_use]
pub fn json_safe_parse(input: &str) -> Value {
    serde_json::from_str(input).unwrap_or_else(|_| Value::String(input.to_string()))
}
