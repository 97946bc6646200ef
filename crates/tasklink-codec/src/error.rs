use thiserror::Error;

/// Errors raised while encoding or decoding a payload.
#[derive(Debug, Error)]
pub enum CodecError {
  /// The value could not be written by the codec.
  #[error("{codec} encode failed: {message}")]
  Encode { codec: &'static str, message: String },

  /// The bytes are not a valid encoding for the codec.
  #[error("{codec} decode failed: {message}")]
  Decode { codec: &'static str, message: String },
}

impl CodecError {
  pub fn encode(codec: &'static str, message: impl Into<String>) -> Self {
    Self::Encode {
      codec,
      message: message.into(),
    }
  }

  pub fn decode(codec: &'static str, message: impl Into<String>) -> Self {
    Self::Decode {
      codec,
      message: message.into(),
    }
  }
}
