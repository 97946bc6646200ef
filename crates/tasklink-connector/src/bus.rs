//! Bus dispatch.

use std::sync::OnceLock;

use tasklink_bus::{BusClient, Envelope};
use tasklink_codec::Value;
use tracing::debug;

use crate::error::ConnectorError;
use crate::services::EngineServices;

/// Sends payloads to in-process bus endpoints.
///
/// The bus client is resolved from the engine services on first use and
/// cached. Concurrent first calls may each resolve a client; one of them is
/// kept and the rest dropped, which is harmless since resolution has no side
/// effects.
#[derive(Debug, Default)]
pub struct BusDispatcher {
  client: OnceLock<BusClient>,
}

impl BusDispatcher {
  pub fn new() -> Self {
    Self::default()
  }

  fn client(&self, services: &EngineServices) -> Result<&BusClient, ConnectorError> {
    if let Some(client) = self.client.get() {
      return Ok(client);
    }

    let client = services
      .message_bus()
      .ok_or(ConnectorError::BusUnavailable)?
      .client();
    Ok(self.client.get_or_init(|| client))
  }

  /// Send `payload` to `endpoint` and return the reply payload.
  pub async fn dispatch(
    &self,
    services: &EngineServices,
    endpoint: &str,
    payload: Value,
  ) -> Result<Value, ConnectorError> {
    let client = self.client(services)?;

    debug!(endpoint, "sending payload over bus");
    let reply = client
      .send(endpoint, Envelope::new(payload))
      .await
      .map_err(|source| ConnectorError::BusTransport {
        endpoint: endpoint.to_string(),
        source,
      })?;

    Ok(reply.into_payload())
  }
}
