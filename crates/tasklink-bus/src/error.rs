use thiserror::Error;

/// Errors raised by the message bus.
#[derive(Debug, Error)]
pub enum BusError {
  #[error("invalid bus address '{address}': expected 'vm:<name>'")]
  InvalidAddress { address: String },

  #[error("no endpoint bound at '{address}'")]
  NoEndpoint { address: String },

  #[error("an endpoint is already bound at '{address}'")]
  AddressInUse { address: String },

  /// The endpoint went away before replying.
  #[error("endpoint '{address}' closed before replying")]
  EndpointClosed { address: String },

  /// The endpoint's handler rejected the message.
  #[error("endpoint '{address}' failed: {source}")]
  Handler {
    address: String,
    #[source]
    source: HandlerError,
  },
}

/// Failure reported by a [`crate::MessageHandler`].
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct HandlerError {
  pub message: String,
}

impl HandlerError {
  pub fn new(message: impl Into<String>) -> Self {
    Self {
      message: message.into(),
    }
  }
}
