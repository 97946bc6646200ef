//! In-process message bus for tasklink.
//!
//! Endpoints are addressed with the `vm:` scheme (for example
//! `vm:order.queue`). A [`MessageBus`] owns the endpoint table; each bound
//! endpoint is served by one tokio task that feeds requests to its
//! [`MessageHandler`] in arrival order. [`BusClient::send`] delivers an
//! [`Envelope`] and waits for the reply envelope.
//!
//! Payloads travel as in-memory [`Value`]s: nothing is serialized.

mod bus;
mod envelope;
mod error;
mod handler;

pub use bus::{BusClient, MessageBus};
pub use envelope::Envelope;
pub use error::{BusError, HandlerError};
pub use handler::{Echo, FnHandler, MessageHandler, from_fn};
pub use tasklink_codec::Value;

/// Address prefix reserved for the in-process bus.
pub const BUS_SCHEME: &str = "vm:";

/// Whether `address` names an in-process bus endpoint.
pub fn is_bus_address(address: &str) -> bool {
  address.starts_with(BUS_SCHEME)
}
