//! Data values bound to templates.
//!
//! A [`Value`] is the render-time data model: scalars, ordered mappings,
//! sequences and computed entries that are evaluated on lookup.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use indexmap::IndexMap;
use thiserror::Error;

/// Errors that can occur when loading data files
#[derive(Error, Debug)]
pub enum DataError {
    #[error("Failed to read data file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse JSON data: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Failed to parse TOML data: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Unsupported data file format: {0}")]
    UnsupportedFormat(String),
}

/// A value evaluated on lookup.
///
/// The argument is the value that holds the computed entry.
#[derive(Clone)]
pub struct Computed(Arc<dyn Fn(&Value) -> Value + Send + Sync>);

impl Computed {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn call(&self, context: &Value) -> Value {
        (self.0)(context)
    }
}

impl fmt::Debug for Computed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Computed(..)")
    }
}

/// Render-time data
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Sequence(Vec<Value>),
    /// Entries in insertion order
    Mapping(IndexMap<String, Value>),
    Computed(Computed),
}

impl Value {
    /// Wrap a closure as a computed value
    pub fn computed<F>(f: F) -> Self
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        Value::Computed(Computed::new(f))
    }

    /// Build a mapping from key/value pairs
    pub fn mapping<K, V, I>(entries: I) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        Value::Mapping(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            Value::Sequence(_) | Value::Mapping(_) | Value::Computed(_) => true,
        }
    }

    /// The number zero, of either sign
    pub fn is_zero(&self) -> bool {
        matches!(self, Value::Number(n) if *n == 0.0)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Look up a key in a mapping
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Mapping(entries) => entries.get(key),
            _ => None,
        }
    }

    /// Convert to JSON; computed entries are dropped and non-finite numbers become null
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;

        match self {
            Value::Null | Value::Computed(_) => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::Number(n) => number_to_json(*n),
            Value::String(s) => Json::String(s.clone()),
            Value::Sequence(items) => Json::Array(items.iter().map(Value::to_json).collect()),
            Value::Mapping(entries) => Json::Object(
                entries
                    .iter()
                    .filter(|(_, v)| !matches!(v, Value::Computed(_)))
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }

    /// Load a JSON or TOML data file, chosen by extension
    pub fn from_file(path: &Path) -> Result<Self, DataError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match extension.as_deref() {
            Some("json") => {
                let content = std::fs::read_to_string(path)?;
                Self::from_json_str(&content)
            }
            Some("toml") => {
                let content = std::fs::read_to_string(path)?;
                Self::from_toml_str(&content)
            }
            _ => Err(DataError::UnsupportedFormat(path.display().to_string())),
        }
    }

    pub fn from_json_str(content: &str) -> Result<Self, DataError> {
        let json: serde_json::Value = serde_json::from_str(content)?;
        Ok(json.into())
    }

    pub fn from_toml_str(content: &str) -> Result<Self, DataError> {
        let table: toml::Table = toml::from_str(content)?;
        Ok(table.into())
    }
}

fn number_to_json(n: f64) -> serde_json::Value {
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        return serde_json::Value::from(n as i64);
    }
    serde_json::Number::from_f64(n)
        .map(serde_json::Value::Number)
        .unwrap_or(serde_json::Value::Null)
}

fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n == f64::INFINITY {
        "Infinity".to_string()
    } else if n == f64::NEG_INFINITY {
        "-Infinity".to_string()
    } else if n == 0.0 {
        "0".to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e21 {
        format!("{:.0}", n)
    } else {
        n.to_string()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null | Value::Computed(_) => Ok(()),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => f.write_str(&format_number(*n)),
            Value::String(s) => f.write_str(s),
            Value::Sequence(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}", item)?;
                }
                Ok(())
            }
            Value::Mapping(_) => write!(f, "{}", self.to_json()),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Sequence(a), Value::Sequence(b)) => a == b,
            (Value::Mapping(a), Value::Mapping(b)) => a == b,
            // Computed values have no identity to compare
            _ => false,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n.into())
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::Number(n as f64)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Sequence(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

impl From<IndexMap<String, Value>> for Value {
    fn from(entries: IndexMap<String, Value>) -> Self {
        Value::Mapping(entries)
    }
}

impl From<Computed> for Value {
    fn from(computed: Computed) -> Self {
        Value::Computed(computed)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        use serde_json::Value as Json;

        match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(b),
            Json::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            Json::String(s) => Value::String(s),
            Json::Array(items) => Value::Sequence(items.into_iter().map(Value::from).collect()),
            Json::Object(entries) => Value::Mapping(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<toml::Value> for Value {
    fn from(value: toml::Value) -> Self {
        use toml::Value as Toml;

        match value {
            Toml::String(s) => Value::String(s),
            Toml::Integer(n) => Value::Number(n as f64),
            Toml::Float(n) => Value::Number(n),
            Toml::Boolean(b) => Value::Bool(b),
            Toml::Datetime(dt) => Value::String(dt.to_string()),
            Toml::Array(items) => Value::Sequence(items.into_iter().map(Value::from).collect()),
            Toml::Table(table) => table.into(),
        }
    }
}

impl From<toml::Table> for Value {
    fn from(table: toml::Table) -> Self {
        Value::Mapping(
            table
                .into_iter()
                .map(|(k, v)| (k, Value::from(v)))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_truthiness() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::from("").is_truthy());
        assert!(!Value::from(0).is_truthy());
        assert!(!Value::Number(f64::NAN).is_truthy());
        assert!(!Value::from(false).is_truthy());
        assert!(Value::from("x").is_truthy());
        assert!(Value::Sequence(vec![]).is_truthy());
        assert!(Value::Mapping(IndexMap::new()).is_truthy());
        assert!(Value::computed(|_| Value::Null).is_truthy());
    }

    #[test]
    fn test_number_text() {
        assert_eq!(Value::from(3).to_string(), "3");
        assert_eq!(Value::from(1.5).to_string(), "1.5");
        assert_eq!(Value::Number(-0.0).to_string(), "0");
        assert_eq!(Value::Number(f64::INFINITY).to_string(), "Infinity");
        assert_eq!(Value::Number(f64::NEG_INFINITY).to_string(), "-Infinity");
        assert_eq!(Value::Number(f64::NAN).to_string(), "NaN");
    }

    #[test]
    fn test_sequence_text() {
        let value = Value::from(vec![Value::from("a"), Value::Null, Value::from(2)]);
        assert_eq!(value.to_string(), "a,,2");
    }

    #[test]
    fn test_mapping_text_is_compact_json() {
        let value = Value::from(json!({"b": 1, "a": [true, "x"]}));
        assert_eq!(value.to_string(), r#"{"b":1,"a":[true,"x"]}"#);
    }

    #[test]
    fn test_computed_text_is_empty() {
        assert_eq!(Value::computed(|_| Value::from("x")).to_string(), "");
    }

    #[test]
    fn test_json_preserves_order() {
        let value = Value::from(json!({"z": 1, "a": 2}));
        let Value::Mapping(entries) = value else {
            panic!("expected mapping");
        };
        let keys: Vec<_> = entries.keys().cloned().collect();
        assert_eq!(keys, vec!["z", "a"]);
    }

    #[test]
    fn test_toml_conversion() {
        let value = Value::from_toml_str("title = 'Home'\ncount = 2\n[nested]\nok = true\n")
            .expect("Should parse");
        assert_eq!(value.get("title"), Some(&Value::from("Home")));
        assert_eq!(value.get("count"), Some(&Value::from(2)));
        assert_eq!(
            value.get("nested").and_then(|n| n.get("ok")),
            Some(&Value::from(true))
        );
    }

    #[test]
    fn test_from_file_rejects_unknown_extension() {
        let err = Value::from_file(Path::new("data.yaml")).unwrap_err();
        assert!(matches!(err, DataError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_computed_never_equal() {
        let computed = Value::computed(|_| Value::Null);
        assert_ne!(computed.clone(), computed);
    }
}
