//! Depth-limited deserialization for [`Value`].
//!
//! Non-self-describing formats like bincode place no bound on nesting, so a
//! hostile frame of nested one-element lists would recurse until the stack
//! overflows. Every list and map level is counted here and decoding fails
//! past [`Value::MAX_DEPTH`].

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{self, DeserializeSeed, EnumAccess, MapAccess, SeqAccess, VariantAccess, Visitor};
use serde::{Deserialize, Deserializer};

use crate::value::Value;

const VARIANTS: &[&str] = &["Null", "Bool", "Int", "Float", "String", "Bytes", "List", "Map"];

impl<'de> Deserialize<'de> for Value {
  fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
  where
    D: Deserializer<'de>,
  {
    ValueSeed { depth: 0 }.deserialize(deserializer)
  }
}

enum Tag {
  Null,
  Bool,
  Int,
  Float,
  String,
  Bytes,
  List,
  Map,
}

impl<'de> Deserialize<'de> for Tag {
  fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
  where
    D: Deserializer<'de>,
  {
    deserializer.deserialize_identifier(TagVisitor)
  }
}

struct TagVisitor;

impl Visitor<'_> for TagVisitor {
  type Value = Tag;

  fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("a value variant")
  }

  fn visit_u64<E: de::Error>(self, index: u64) -> Result<Tag, E> {
    match index {
      0 => Ok(Tag::Null),
      1 => Ok(Tag::Bool),
      2 => Ok(Tag::Int),
      3 => Ok(Tag::Float),
      4 => Ok(Tag::String),
      5 => Ok(Tag::Bytes),
      6 => Ok(Tag::List),
      7 => Ok(Tag::Map),
      _ => Err(E::invalid_value(
        de::Unexpected::Unsigned(index),
        &"variant index 0 <= i < 8",
      )),
    }
  }

  fn visit_str<E: de::Error>(self, name: &str) -> Result<Tag, E> {
    match name {
      "Null" => Ok(Tag::Null),
      "Bool" => Ok(Tag::Bool),
      "Int" => Ok(Tag::Int),
      "Float" => Ok(Tag::Float),
      "String" => Ok(Tag::String),
      "Bytes" => Ok(Tag::Bytes),
      "List" => Ok(Tag::List),
      "Map" => Ok(Tag::Map),
      _ => Err(E::unknown_variant(name, VARIANTS)),
    }
  }
}

/// Deserializes one value that sits inside `depth` enclosing containers.
#[derive(Clone, Copy)]
struct ValueSeed {
  depth: usize,
}

impl ValueSeed {
  fn nested<E: de::Error>(self) -> Result<Self, E> {
    if self.depth >= Value::MAX_DEPTH {
      return Err(E::custom(format!(
        "value nested deeper than {} levels",
        Value::MAX_DEPTH
      )));
    }
    Ok(Self {
      depth: self.depth + 1,
    })
  }
}

impl<'de> DeserializeSeed<'de> for ValueSeed {
  type Value = Value;

  fn deserialize<D>(self, deserializer: D) -> Result<Value, D::Error>
  where
    D: Deserializer<'de>,
  {
    deserializer.deserialize_enum("Value", VARIANTS, self)
  }
}

impl<'de> Visitor<'de> for ValueSeed {
  type Value = Value;

  fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("a payload value")
  }

  fn visit_enum<A>(self, data: A) -> Result<Value, A::Error>
  where
    A: EnumAccess<'de>,
  {
    let (tag, variant) = data.variant::<Tag>()?;
    match tag {
      Tag::Null => variant.unit_variant().map(|()| Value::Null),
      Tag::Bool => variant.newtype_variant().map(Value::Bool),
      Tag::Int => variant.newtype_variant().map(Value::Int),
      Tag::Float => variant.newtype_variant().map(Value::Float),
      Tag::String => variant.newtype_variant().map(Value::String),
      Tag::Bytes => variant.newtype_variant().map(Value::Bytes),
      Tag::List => {
        let inner = self.nested::<A::Error>()?;
        variant.newtype_variant_seed(ListSeed(inner)).map(Value::List)
      }
      Tag::Map => {
        let inner = self.nested::<A::Error>()?;
        variant.newtype_variant_seed(MapSeed(inner)).map(Value::Map)
      }
    }
  }
}

struct ListSeed(ValueSeed);

impl<'de> DeserializeSeed<'de> for ListSeed {
  type Value = Vec<Value>;

  fn deserialize<D>(self, deserializer: D) -> Result<Vec<Value>, D::Error>
  where
    D: Deserializer<'de>,
  {
    deserializer.deserialize_seq(self)
  }
}

impl<'de> Visitor<'de> for ListSeed {
  type Value = Vec<Value>;

  fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("a list of payload values")
  }

  fn visit_seq<A>(self, mut seq: A) -> Result<Vec<Value>, A::Error>
  where
    A: SeqAccess<'de>,
  {
    // Length hints come from the wire; cap the preallocation.
    let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0).min(1024));
    while let Some(item) = seq.next_element_seed(self.0)? {
      items.push(item);
    }
    Ok(items)
  }
}

struct MapSeed(ValueSeed);

impl<'de> DeserializeSeed<'de> for MapSeed {
  type Value = BTreeMap<String, Value>;

  fn deserialize<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
  where
    D: Deserializer<'de>,
  {
    deserializer.deserialize_map(self)
  }
}

impl<'de> Visitor<'de> for MapSeed {
  type Value = BTreeMap<String, Value>;

  fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("a map of payload values")
  }

  fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
  where
    A: MapAccess<'de>,
  {
    let mut map = BTreeMap::new();
    while let Some(key) = access.next_key::<String>()? {
      let value = access.next_value_seed(self.0)?;
      map.insert(key, value);
    }
    Ok(map)
  }
}
