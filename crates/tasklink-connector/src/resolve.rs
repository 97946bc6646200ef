//! Field resolution.

use tasklink_config::ConnectorConfig;
use tasklink_script::{DEFAULT_LANGUAGE, Value};

use crate::error::ConnectorError;
use crate::execution::ExecutionContext;
use crate::http::Credentials;

/// Evaluate one configuration slot to text.
///
/// Returns `None` when the slot is empty or evaluates to null or the empty string.
pub fn resolve_field(
  field: &'static str,
  expression: Option<&str>,
  execution: &dyn ExecutionContext,
) -> Result<Option<String>, ConnectorError> {
  let Some(expression) = expression else {
    return Ok(None);
  };

  let value = execution
    .evaluate(expression)
    .map_err(|source| ConnectorError::Evaluation { field, source })?;
  Ok(value.to_text())
}

/// Per-call values: the six resolved fields plus the evaluated payload.
///
/// Built at the start of an invocation and dropped at its end.
#[derive(Clone, Default)]
pub struct ResolvedInvocation {
  pub endpoint_url: Option<String>,
  pub language: Option<String>,
  pub payload_expression: Option<String>,
  pub result_variable: Option<String>,
  pub username: Option<String>,
  pub password: Option<String>,
  pub payload: Value,
}

impl ResolvedInvocation {
  /// Resolve every slot of `config` against `execution`.
  pub fn resolve(
    config: &ConnectorConfig,
    execution: &dyn ExecutionContext,
  ) -> Result<Self, ConnectorError> {
    let resolve = |field, slot: &Option<String>| resolve_field(field, slot.as_deref(), execution);

    Ok(Self {
      endpoint_url: resolve("endpoint_url", &config.endpoint_url)?,
      language: resolve("language", &config.language)?,
      payload_expression: resolve("payload_expression", &config.payload_expression)?,
      result_variable: resolve("result_variable", &config.result_variable)?,
      username: resolve("username", &config.username)?,
      password: resolve("password", &config.password)?,
      payload: Value::Null,
    })
  }

  pub fn endpoint_url(&self) -> Result<&str, ConnectorError> {
    self
      .endpoint_url
      .as_deref()
      .ok_or(ConnectorError::MissingField {
        field: "endpoint_url",
      })
  }

  pub fn payload_expression(&self) -> Result<&str, ConnectorError> {
    self
      .payload_expression
      .as_deref()
      .ok_or(ConnectorError::MissingField {
        field: "payload_expression",
      })
  }

  pub fn language(&self) -> &str {
    self.language.as_deref().unwrap_or(DEFAULT_LANGUAGE)
  }

  pub fn result_variable(&self) -> Option<&str> {
    self.result_variable.as_deref()
  }

  /// Credentials, only when both username and password resolved.
  pub fn credentials(&self) -> Option<Credentials<'_>> {
    match (&self.username, &self.password) {
      (Some(username), Some(password)) => Some(Credentials { username, password }),
      _ => None,
    }
  }
}

impl std::fmt::Debug for ResolvedInvocation {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("ResolvedInvocation")
      .field("endpoint_url", &self.endpoint_url)
      .field("language", &self.language)
      .field("payload_expression", &self.payload_expression)
      .field("result_variable", &self.result_variable)
      .field("username", &self.username)
      .field("password", &self.password.as_ref().map(|_| "***"))
      .field("payload", &self.payload)
      .finish()
  }
}
