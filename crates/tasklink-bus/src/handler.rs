use async_trait::async_trait;

use crate::envelope::Envelope;
use crate::error::HandlerError;
use tasklink_codec::Value;

/// Serves requests sent to a bus endpoint.
#[async_trait]
pub trait MessageHandler: Send + Sync {
  /// Handle one request and return the reply payload.
  async fn handle(&self, message: &Envelope) -> Result<Value, HandlerError>;
}

/// Replies with the request payload unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Echo;

#[async_trait]
impl MessageHandler for Echo {
  async fn handle(&self, message: &Envelope) -> Result<Value, HandlerError> {
    Ok(message.payload.clone())
  }
}

/// Handler backed by a synchronous closure. Built with [`from_fn`].
pub struct FnHandler<F> {
  f: F,
}

/// Wrap a closure as a [`MessageHandler`].
pub fn from_fn<F>(f: F) -> FnHandler<F>
where
  F: Fn(&Envelope) -> Result<Value, HandlerError> + Send + Sync,
{
  FnHandler { f }
}

#[async_trait]
impl<F> MessageHandler for FnHandler<F>
where
  F: Fn(&Envelope) -> Result<Value, HandlerError> + Send + Sync,
{
  async fn handle(&self, message: &Envelope) -> Result<Value, HandlerError> {
    (self.f)(message)
  }
}
