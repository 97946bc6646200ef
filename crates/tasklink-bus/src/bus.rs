//! Endpoint table and request/reply delivery.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use crate::envelope::Envelope;
use crate::error::{BusError, HandlerError};
use crate::handler::MessageHandler;
use crate::BUS_SCHEME;

/// Pending requests an endpoint buffers before senders wait.
const ENDPOINT_CAPACITY: usize = 64;

struct Request {
  message: Envelope,
  reply: oneshot::Sender<Result<Envelope, HandlerError>>,
}

/// The in-process message bus.
///
/// Cloning is cheap; clones share the same endpoint table.
#[derive(Clone, Default)]
pub struct MessageBus {
  endpoints: Arc<RwLock<HashMap<String, mpsc::Sender<Request>>>>,
}

impl MessageBus {
  pub fn new() -> Self {
    Self::default()
  }

  /// Bind `handler` at `address` and start serving it.
  ///
  /// Must be called from within a tokio runtime.
  pub fn bind(&self, address: &str, handler: impl MessageHandler + 'static) -> Result<(), BusError> {
    validate_address(address)?;

    let mut endpoints = self
      .endpoints
      .write()
      .unwrap_or_else(PoisonError::into_inner);
    if endpoints.contains_key(address) {
      return Err(BusError::AddressInUse {
        address: address.to_string(),
      });
    }

    let (tx, rx) = mpsc::channel(ENDPOINT_CAPACITY);
    endpoints.insert(address.to_string(), tx);
    tokio::spawn(serve(address.to_string(), Box::new(handler), rx));

    debug!(address, "bus endpoint bound");
    Ok(())
  }

  /// Remove the endpoint at `address`. Requests already queued are still served.
  pub fn unbind(&self, address: &str) -> bool {
    self
      .endpoints
      .write()
      .unwrap_or_else(PoisonError::into_inner)
      .remove(address)
      .is_some()
  }

  pub fn is_bound(&self, address: &str) -> bool {
    self
      .endpoints
      .read()
      .unwrap_or_else(PoisonError::into_inner)
      .contains_key(address)
  }

  /// A client that sends through this bus.
  pub fn client(&self) -> BusClient {
    BusClient { bus: self.clone() }
  }

  fn sender(&self, address: &str) -> Option<mpsc::Sender<Request>> {
    self
      .endpoints
      .read()
      .unwrap_or_else(PoisonError::into_inner)
      .get(address)
      .cloned()
  }
}

impl std::fmt::Debug for MessageBus {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let endpoints = self
      .endpoints
      .read()
      .unwrap_or_else(PoisonError::into_inner);
    let mut addresses: Vec<&String> = endpoints.keys().collect();
    addresses.sort();
    f.debug_struct("MessageBus")
      .field("endpoints", &addresses)
      .finish()
  }
}

/// Sends messages to bus endpoints and waits for their replies.
#[derive(Clone, Debug)]
pub struct BusClient {
  bus: MessageBus,
}

impl BusClient {
  /// Deliver `message` to `address` and wait for the reply.
  ///
  /// There is no timeout: a handler that never finishes blocks the caller.
  pub async fn send(&self, address: &str, message: Envelope) -> Result<Envelope, BusError> {
    validate_address(address)?;

    let sender = self.bus.sender(address).ok_or_else(|| BusError::NoEndpoint {
      address: address.to_string(),
    })?;

    let closed = || BusError::EndpointClosed {
      address: address.to_string(),
    };

    let (reply_tx, reply_rx) = oneshot::channel();
    sender
      .send(Request {
        message,
        reply: reply_tx,
      })
      .await
      .map_err(|_| closed())?;

    let reply = reply_rx.await.map_err(|_| closed())?;
    reply.map_err(|source| BusError::Handler {
      address: address.to_string(),
      source,
    })
  }
}

async fn serve(
  address: String,
  handler: Box<dyn MessageHandler>,
  mut requests: mpsc::Receiver<Request>,
) {
  while let Some(request) = requests.recv().await {
    let result = handler
      .handle(&request.message)
      .await
      .map(|payload| request.message.reply(payload));

    if request.reply.send(result).is_err() {
      warn!(address = %address, "bus requester went away before the reply");
    }
  }
  debug!(address = %address, "bus endpoint stopped");
}

fn validate_address(address: &str) -> Result<(), BusError> {
  match address.strip_prefix(BUS_SCHEME) {
    Some(name) if !name.trim().is_empty() => Ok(()),
    _ => Err(BusError::InvalidAddress {
      address: address.to_string(),
    }),
  }
}
