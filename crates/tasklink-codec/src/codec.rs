//! Wire codecs for payload values.

use bincode::Options;

use crate::error::CodecError;
use crate::value::Value;

/// Serialize a payload to bytes and back.
///
/// Implementations are shared across invocations and must be stateless.
pub trait PayloadCodec: Send + Sync {
  /// Short name used in logs and error messages.
  fn name(&self) -> &'static str;

  /// MIME type sent as the request `Content-Type`.
  fn content_type(&self) -> &'static str;

  fn encode(&self, value: &Value) -> Result<Vec<u8>, CodecError>;

  fn decode(&self, bytes: &[u8]) -> Result<Value, CodecError>;
}

/// Binary codec built on bincode.
///
/// Every frame starts with [`BincodeCodec::MAGIC`]. Decoding rejects frames
/// without it, frames with trailing bytes, and frames whose declared lengths
/// exceed the configured limit.
#[derive(Debug, Clone)]
pub struct BincodeCodec {
  limit: u64,
}

impl BincodeCodec {
  pub const MAGIC: [u8; 4] = *b"TLK1";
  pub const CONTENT_TYPE: &'static str = "application/x-tasklink-bincode";
  const NAME: &'static str = "bincode";
  const DEFAULT_LIMIT: u64 = 64 * 1024 * 1024;

  pub fn new() -> Self {
    Self {
      limit: Self::DEFAULT_LIMIT,
    }
  }

  /// Bound the number of bytes a single decode may allocate.
  pub fn with_limit(limit: u64) -> Self {
    Self { limit }
  }
}

impl Default for BincodeCodec {
  fn default() -> Self {
    Self::new()
  }
}

impl PayloadCodec for BincodeCodec {
  fn name(&self) -> &'static str {
    Self::NAME
  }

  fn content_type(&self) -> &'static str {
    Self::CONTENT_TYPE
  }

  fn encode(&self, value: &Value) -> Result<Vec<u8>, CodecError> {
    let body = bincode::DefaultOptions::new()
      .with_fixint_encoding()
      .serialize(value)
      .map_err(|e| CodecError::encode(Self::NAME, e.to_string()))?;

    let mut frame = Vec::with_capacity(Self::MAGIC.len() + body.len());
    frame.extend_from_slice(&Self::MAGIC);
    frame.extend_from_slice(&body);
    Ok(frame)
  }

  fn decode(&self, bytes: &[u8]) -> Result<Value, CodecError> {
    let body = bytes
      .strip_prefix(&Self::MAGIC[..])
      .ok_or_else(|| CodecError::decode(Self::NAME, "missing frame header"))?;

    bincode::DefaultOptions::new()
      .with_fixint_encoding()
      .reject_trailing_bytes()
      .with_limit(self.limit)
      .deserialize(body)
      .map_err(|e| CodecError::decode(Self::NAME, e.to_string()))
  }
}

/// Text codec that carries the JSON form of a value.
///
/// Byte strings do not survive the trip: they come back as lists of integers.
#[derive(Debug, Clone, Default)]
pub struct JsonCodec;

impl JsonCodec {
  const NAME: &'static str = "json";
}

impl PayloadCodec for JsonCodec {
  fn name(&self) -> &'static str {
    Self::NAME
  }

  fn content_type(&self) -> &'static str {
    "application/json"
  }

  fn encode(&self, value: &Value) -> Result<Vec<u8>, CodecError> {
    serde_json::to_vec(&value.to_json()).map_err(|e| CodecError::encode(Self::NAME, e.to_string()))
  }

  fn decode(&self, bytes: &[u8]) -> Result<Value, CodecError> {
    serde_json::from_slice::<serde_json::Value>(bytes)
      .map(Value::from)
      .map_err(|e| CodecError::decode(Self::NAME, e.to_string()))
  }
}
