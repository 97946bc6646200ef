//! HTTP dispatch.
//!
//! One POST per invocation: the payload is encoded with the configured codec,
//! the raw reply body is decoded with the same codec. No timeout and no retry
//! beyond reqwest's defaults.

use std::sync::Arc;

use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use tasklink_codec::{BincodeCodec, PayloadCodec, Value};
use tracing::{debug, warn};
use url::Url;

use crate::error::ConnectorError;

/// Basic credentials for the outbound request.
#[derive(Clone, Copy)]
pub struct Credentials<'a> {
  pub username: &'a str,
  pub password: &'a str,
}

impl std::fmt::Debug for Credentials<'_> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Credentials")
      .field("username", &self.username)
      .field("password", &"***")
      .finish()
  }
}

/// Sends payloads to HTTP endpoints.
#[derive(Clone)]
pub struct HttpDispatcher {
  codec: Arc<dyn PayloadCodec>,
}

impl HttpDispatcher {
  pub fn new(codec: Arc<dyn PayloadCodec>) -> Self {
    Self { codec }
  }

  pub fn codec(&self) -> &dyn PayloadCodec {
    self.codec.as_ref()
  }

  /// POST `payload` to `endpoint` and decode the reply.
  ///
  /// Credentials, when given, are sent preemptively to the configured
  /// endpoint host only; redirects to other hosts do not carry them.
  /// Returns `None` when the response has no body.
  pub async fn dispatch(
    &self,
    endpoint: &str,
    payload: &Value,
    credentials: Option<Credentials<'_>>,
  ) -> Result<Option<Value>, ConnectorError> {
    let url = parse_endpoint(endpoint)?;

    // Per-call client without idle pooling: the connection is closed when the
    // client and response drop, on every exit path below.
    let client = Client::builder()
      .pool_max_idle_per_host(0)
      .build()
      .map_err(|source| ConnectorError::HttpTransport {
        endpoint: endpoint.to_string(),
        source,
      })?;

    let body = self
      .codec
      .encode(payload)
      .map_err(|source| ConnectorError::PayloadEncoding { source })?;

    debug!(
      endpoint,
      codec = self.codec.name(),
      bytes = body.len(),
      authenticated = credentials.is_some(),
      "posting payload"
    );

    let mut request = client
      .post(url)
      .header(CONTENT_TYPE, self.codec.content_type())
      .body(body);
    if let Some(credentials) = credentials {
      request = request.basic_auth(credentials.username, Some(credentials.password));
    }

    let transport = |source| ConnectorError::HttpTransport {
      endpoint: endpoint.to_string(),
      source,
    };

    let response = request.send().await.map_err(transport)?;
    let status = response.status();
    if !status.is_success() {
      warn!(endpoint, status = status.as_u16(), "endpoint returned non-success status");
    }
    let bytes = response.bytes().await.map_err(transport)?;

    if bytes.is_empty() {
      debug!(endpoint, "response has no body");
      return Ok(None);
    }

    self
      .codec
      .decode(&bytes)
      .map(Some)
      .map_err(|source| ConnectorError::ResponseDecoding {
        endpoint: endpoint.to_string(),
        source,
      })
  }
}

impl Default for HttpDispatcher {
  fn default() -> Self {
    Self::new(Arc::new(BincodeCodec::new()))
  }
}

impl std::fmt::Debug for HttpDispatcher {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("HttpDispatcher")
      .field("codec", &self.codec.name())
      .finish()
  }
}

fn parse_endpoint(endpoint: &str) -> Result<Url, ConnectorError> {
  let invalid = |message: String| ConnectorError::InvalidEndpoint {
    endpoint: endpoint.to_string(),
    message,
  };

  let url = Url::parse(endpoint).map_err(|e| invalid(e.to_string()))?;
  match url.scheme() {
    "http" | "https" => Ok(url),
    other => Err(invalid(format!("unsupported scheme '{}'", other))),
  }
}
