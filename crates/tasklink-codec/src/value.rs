//! The payload object model.
//!
//! A [`Value`] is the in-memory form of anything a payload expression can
//! produce and anything a remote endpoint can send back. It is a tree: nested
//! lists and maps own their children, so a value graph cannot contain cycles.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// An application-defined payload value.
///
/// Serialized with serde's externally tagged enum representation so that
/// non-self-describing codecs (bincode) can round-trip it. Deserialization
/// rejects lists and maps nested deeper than [`Value::MAX_DEPTH`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub enum Value {
  #[default]
  Null,
  Bool(bool),
  Int(i64),
  Float(f64),
  String(String),
  Bytes(Vec<u8>),
  List(Vec<Value>),
  Map(BTreeMap<String, Value>),
}

impl Value {
  /// Deepest list/map nesting accepted from decoders and script engines.
  pub const MAX_DEPTH: usize = 64;

  pub fn is_null(&self) -> bool {
    matches!(self, Value::Null)
  }

  pub fn as_str(&self) -> Option<&str> {
    match self {
      Value::String(s) => Some(s),
      _ => None,
    }
  }

  /// Look up a key when this value is a map.
  pub fn get(&self, key: &str) -> Option<&Value> {
    match self {
      Value::Map(map) => map.get(key),
      _ => None,
    }
  }

  /// Text form used when a value is read as a configuration field.
  ///
  /// Returns `None` for null and for the empty string.
  pub fn to_text(&self) -> Option<String> {
    match self {
      Value::Null => None,
      Value::String(s) if s.is_empty() => None,
      other => Some(other.to_string()),
    }
  }

  /// Convert to JSON. Byte strings become arrays of numbers.
  pub fn to_json(&self) -> serde_json::Value {
    match self {
      Value::Null => serde_json::Value::Null,
      Value::Bool(b) => serde_json::Value::Bool(*b),
      Value::Int(i) => serde_json::Value::Number((*i).into()),
      Value::Float(f) => serde_json::Number::from_f64(*f)
        .map(serde_json::Value::Number)
        .unwrap_or(serde_json::Value::Null),
      Value::String(s) => serde_json::Value::String(s.clone()),
      Value::Bytes(b) => serde_json::Value::Array(
        b.iter()
          .map(|byte| serde_json::Value::Number((*byte).into()))
          .collect(),
      ),
      Value::List(items) => serde_json::Value::Array(items.iter().map(Value::to_json).collect()),
      Value::Map(map) => serde_json::Value::Object(
        map
          .iter()
          .map(|(k, v)| (k.clone(), v.to_json()))
          .collect(),
      ),
    }
  }
}

impl fmt::Display for Value {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Value::Null => Ok(()),
      Value::Bool(b) => write!(f, "{}", b),
      Value::Int(i) => write!(f, "{}", i),
      Value::Float(x) => write!(f, "{}", x),
      Value::String(s) => f.write_str(s),
      Value::Bytes(_) | Value::List(_) | Value::Map(_) => write!(f, "{}", self.to_json()),
    }
  }
}

impl From<serde_json::Value> for Value {
  fn from(json: serde_json::Value) -> Self {
    match json {
      serde_json::Value::Null => Value::Null,
      serde_json::Value::Bool(b) => Value::Bool(b),
      serde_json::Value::Number(n) => match n.as_i64() {
        Some(i) => Value::Int(i),
        None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
      },
      serde_json::Value::String(s) => Value::String(s),
      serde_json::Value::Array(items) => Value::List(items.into_iter().map(Value::from).collect()),
      serde_json::Value::Object(map) => {
        Value::Map(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
      }
    }
  }
}

impl From<&Value> for serde_json::Value {
  fn from(value: &Value) -> Self {
    value.to_json()
  }
}

impl From<bool> for Value {
  fn from(b: bool) -> Self {
    Value::Bool(b)
  }
}

impl From<i64> for Value {
  fn from(i: i64) -> Self {
    Value::Int(i)
  }
}

impl From<f64> for Value {
  fn from(f: f64) -> Self {
    Value::Float(f)
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

impl From<Vec<Value>> for Value {
  fn from(items: Vec<Value>) -> Self {
    Value::List(items)
  }
}

impl From<BTreeMap<String, Value>> for Value {
  fn from(map: BTreeMap<String, Value>) -> Self {
    Value::Map(map)
  }
}
