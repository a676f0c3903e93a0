//! Untyped document values.
//!
//! Every document payload and every filter condition is a [`Value`]: a
//! recursively-typed, JSON-like tagged variant. Conversions to and from
//! [`serde_json::Value`] are lossless for everything JSON can express, except
//! that all numbers are carried as `f64`.

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value as JsonValue};
use std::{collections::BTreeMap, fmt};

use crate::error::{DocumentStoreError, DocumentStoreResult};

/// A mapping from string keys to values. Keys are unique; ordering carries no meaning.
pub type Map = BTreeMap<String, Value>;

/// A JSON-like value stored in (or matched against) a document.
///
/// # Example
///
/// ```ignore
/// use peerdoc_core::value::Value;
///
/// let value = Value::from(serde_json::json!({ "name": "Alice", "age": 30 }));
/// assert_eq!(value.get("age"), Some(&Value::Number(30.0)));
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "JsonValue", into = "JsonValue")]
pub enum Value {
    /// The absence of a value.
    #[default]
    Null,
    /// A boolean.
    Bool(bool),
    /// Any number; integers are widened to `f64`.
    Number(f64),
    /// A UTF-8 string.
    String(String),
    /// An ordered list of values.
    Array(Vec<Value>),
    /// A nested mapping.
    Map(Map),
}

impl Value {
    /// Returns `true` if this is [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Map> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Looks up a key when this value is a map.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_map().and_then(|map| map.get(key))
    }

    /// Attempts to read this value as a number.
    ///
    /// Numbers are returned as-is and strings are parsed as `f64`. Every
    /// other variant is not numeric.
    pub fn to_number(&self) -> Option<f64> {
        match self {
            Value::Number(value) => Some(*value),
            Value::String(value) => value.parse::<f64>().ok(),
            _ => None,
        }
    }

    /// Consumes this value, returning the inner map.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::InvalidDataShape`] if the value is not a map.
    pub fn into_map(self) -> DocumentStoreResult<Map> {
        match self {
            Value::Map(map) => Ok(map),
            other => Err(DocumentStoreError::InvalidDataShape(format!(
                "expected an object, found {}",
                other.kind()
            ))),
        }
    }

    /// A short, human readable name for the variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Map(_) => "object",
        }
    }

    /// Structural equality.
    ///
    /// Maps are equal when they hold the same keys with structurally equal
    /// values; arrays are compared element-wise in order. Numbers compare by
    /// value, so `NaN` is never equal to itself.
    pub fn structurally_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .zip(b.iter())
                        .all(|(left, right)| left.structurally_eq(right))
            }
            (Value::Map(a), Value::Map(b)) => {
                a.len() == b.len()
                    && a.iter().all(|(key, left)| {
                        b.get(key)
                            .is_some_and(|right| left.structurally_eq(right))
                    })
            }
            _ => false,
        }
    }
}

/// Renders the value the way it is compared lexically: strings raw, numbers
/// in their shortest decimal form, containers as compact JSON.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(value) => write!(f, "{value}"),
            Value::Number(value) => write!(f, "{value}"),
            Value::String(value) => f.write_str(value),
            Value::Array(_) | Value::Map(_) => {
                write!(f, "{}", JsonValue::from(self.clone()))
            }
        }
    }
}

impl From<JsonValue> for Value {
    fn from(value: JsonValue) -> Self {
        match value {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(value) => Value::Bool(value),
            JsonValue::Number(number) => number
                .as_f64()
                .map(Value::Number)
                .unwrap_or(Value::Null),
            JsonValue::String(value) => Value::String(value),
            JsonValue::Array(values) => Value::Array(
                values
                    .into_iter()
                    .map(Value::from)
                    .collect()
            ),
            JsonValue::Object(map) => Value::Map(
                map
                    .into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect()
            ),
        }
    }
}

impl From<Value> for JsonValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => JsonValue::Null,
            Value::Bool(value) => JsonValue::Bool(value),
            Value::Number(value) => number_to_json(value),
            Value::String(value) => JsonValue::String(value),
            Value::Array(values) => JsonValue::Array(
                values
                    .into_iter()
                    .map(JsonValue::from)
                    .collect()
            ),
            Value::Map(map) => JsonValue::Object(
                map
                    .into_iter()
                    .map(|(k, v)| (k, JsonValue::from(v)))
                    .collect()
            ),
        }
    }
}

// Integral values inside the i64 range go out as JSON integers; anything
// JSON cannot represent (NaN, infinities) becomes null.
fn number_to_json(value: f64) -> JsonValue {
    if value.fract() == 0.0 && value >= i64::MIN as f64 && value < i64::MAX as f64 {
        return JsonValue::Number(Number::from(value as i64));
    }

    Number::from_f64(value)
        .map(JsonValue::Number)
        .unwrap_or(JsonValue::Null)
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Number(value as f64)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Number(value as f64)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(values: Vec<Value>) -> Self {
        Value::Array(values)
    }
}

impl From<Map> for Value {
    fn from(map: Map) -> Self {
        Value::Map(map)
    }
}
