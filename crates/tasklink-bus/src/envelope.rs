use std::collections::BTreeMap;

use tasklink_codec::Value;
use uuid::Uuid;

/// A message travelling over the bus.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
  pub id: Uuid,
  /// Id of the request this envelope answers.
  pub correlation_id: Option<Uuid>,
  pub payload: Value,
  pub properties: BTreeMap<String, String>,
}

impl Envelope {
  pub fn new(payload: Value) -> Self {
    Self {
      id: Uuid::new_v4(),
      correlation_id: None,
      payload,
      properties: BTreeMap::new(),
    }
  }

  pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
    self.properties.insert(key.into(), value.into());
    self
  }

  /// Build the reply to this envelope.
  pub fn reply(&self, payload: Value) -> Self {
    Self {
      id: Uuid::new_v4(),
      correlation_id: Some(self.id),
      payload,
      properties: BTreeMap::new(),
    }
  }

  /// Take the payload out of the envelope.
  pub fn into_payload(self) -> Value {
    self.payload
  }
}
