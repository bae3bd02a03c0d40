//! Raw per-post records as produced by the enrichment stage.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One enriched post: `author`, `id`, `thread_title`, `url`, and one object
/// per product type (`razor`, `blade`, `brush`, `soap`), each holding nested
/// `matched` / `enriched` attribute maps.
///
/// Records are read-only input to aggregation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRecord(Map<String, Value>);

impl RawRecord {
    /// Wraps a JSON value if it is an object.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self(fields)),
            _ => None,
        }
    }

    /// Walks `path` through nested objects and returns the value at the end
    /// as a trimmed string.
    ///
    /// A present-but-empty string is returned as `Some("")`. Null, arrays,
    /// objects, missing segments, and paths that run through a non-object
    /// all yield `None`. Numbers and booleans are rendered as JSON text.
    pub fn lookup<S: AsRef<str>>(&self, path: &[S]) -> Option<String> {
        let (first, rest) = path.split_first()?;
        let mut current = self.0.get(first.as_ref())?;

        for segment in rest {
            current = current.as_object()?.get(segment.as_ref())?;
        }

        match current {
            Value::String(s) => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }

    pub fn author(&self) -> Option<String> {
        self.lookup(&["author"])
    }
}
