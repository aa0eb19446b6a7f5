//! Selecting values out of a request's [`Internal`] store.
//!
//! Middlewares that prefetch data (secrets, parameters, clients) park it in
//! `request.internal`. Other middlewares then pull exactly what they need
//! with [`get_internal`], naming values by dotted path:
//!
//! ```text
//! "db"              -> the whole `db` entry
//! "db.credentials"  -> the `credentials` field inside `db`
//! "hosts.0"         -> the first element of the `hosts` array
//! ```
//!
//! Pending entries are awaited concurrently. Output keys are passed through
//! [`sanitize_key`](crate::sanitize_key).

use crate::key::sanitize_key;
use futures_util::future::try_join_all;
use serde_json::{Map, Value};
use stratum_core::{Error, Internal};

/// Which internal values to fetch and under which names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InternalSelector {
    /// Every top-level entry, keyed by its own name.
    All,
    /// A single path, keyed by the path itself.
    Key(String),
    /// Several paths, each keyed by the path itself.
    Keys(Vec<String>),
    /// `(output key, path)` pairs.
    Mapped(Vec<(String, String)>),
}

impl InternalSelector {
    fn pairs(&self, internal: &Internal) -> Vec<(String, String)> {
        match self {
            Self::All => internal.keys().map(|k| (k.to_string(), k.to_string())).collect(),
            Self::Key(path) => vec![(path.clone(), path.clone())],
            Self::Keys(paths) => paths.iter().map(|p| (p.clone(), p.clone())).collect(),
            Self::Mapped(pairs) => pairs.clone(),
        }
    }
}

impl From<&str> for InternalSelector {
    fn from(path: &str) -> Self {
        Self::Key(path.to_string())
    }
}

impl From<Vec<&str>> for InternalSelector {
    fn from(paths: Vec<&str>) -> Self {
        Self::Keys(paths.into_iter().map(str::to_string).collect())
    }
}

/// Resolves the selected values from `internal`.
///
/// Missing roots and missing nested fields resolve to `null`. A pending value
/// that failed makes the whole call fail.
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use stratum_core::Internal;
/// use stratum_util::{get_internal, InternalSelector};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let mut internal = Internal::new();
/// internal.insert("db", json!({"credentials": {"user": "app"}}));
///
/// let selected = get_internal(
///     &InternalSelector::Mapped(vec![("dbUser".into(), "db.credentials.user".into())]),
///     &internal,
/// )
/// .await
/// .unwrap();
///
/// assert_eq!(selected["dbUser"], json!("app"));
/// # }
/// ```
pub async fn get_internal(
    selector: &InternalSelector,
    internal: &Internal,
) -> Result<Map<String, Value>, Error> {
    let pairs = selector.pairs(internal);

    let values = try_join_all(pairs.iter().map(|(_, path)| resolve_path(internal, path))).await?;

    Ok(pairs
        .into_iter()
        .zip(values)
        .map(|((key, _), value)| (sanitize_key(&key), value))
        .collect())
}

async fn resolve_path(internal: &Internal, path: &str) -> Result<Value, Error> {
    let mut segments = path.split('.');
    let root = segments.next().unwrap_or_default();

    let Some(mut value) = internal.resolve(root).await? else {
        tracing::trace!(path, "internal value not found");
        return Ok(Value::Null);
    };

    for segment in segments {
        value = match value {
            Value::Object(mut map) => map.remove(segment).unwrap_or(Value::Null),
            Value::Array(mut items) => match segment.parse::<usize>() {
                Ok(index) if index < items.len() => items.swap_remove(index),
                _ => Value::Null,
            },
            _ => Value::Null,
        };
    }

    Ok(value)
}
