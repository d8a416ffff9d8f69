//! Property values carried on infrastructure nodes.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

/// A map of property names to values.
pub type PropertyMap = HashMap<String, Value>;

/// Untagged value type for node properties.
///
/// Village-state snapshots arrive as plain JSON from the simulator, so this
/// mirrors the JSON data model directly: scalars, lists, and maps. The
/// untagged representation lets `serde_json` deserialize raw snapshot
/// fragments (coordinate pairs, status strings, capacity numbers) without a
/// wrapper schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<Value>),
    Map(HashMap<String, Value>),
}

impl Value {
    /// Extract as f64, coercing integers. Returns `None` for non-numerics.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Truthiness for flag-like properties: accepts booleans, nonzero
    /// numbers, and the strings "true"/"yes"/"active"/"on".
    pub fn as_flag(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            Value::Int(i) => Some(*i != 0),
            Value::Float(f) => Some(*f != 0.0),
            Value::String(s) => Some(matches!(
                s.to_ascii_lowercase().as_str(),
                "true" | "yes" | "active" | "on" | "operational"
            )),
            _ => None,
        }
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
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

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else {
                    Value::Float(n.as_f64().unwrap_or(0.0))
                }
            }
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(xs) => Value::List(xs.into_iter().map(Into::into).collect()),
            serde_json::Value::Object(m) => {
                Value::Map(m.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}
