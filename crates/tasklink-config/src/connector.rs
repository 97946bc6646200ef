use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Expression slots of a send task.
///
/// Every slot is optional at the type level. [`ConnectorConfig::validate`]
/// enforces the definition-time rules: the endpoint address and the payload
/// expression are required, and username and password come as a pair.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectorConfig {
  /// Target address. `vm:` addresses go to the in-process bus, anything else over HTTP.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub endpoint_url: Option<String>,

  /// Scripting language of the payload expression.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub language: Option<String>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub payload_expression: Option<String>,

  /// Variable the reply is stored in.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub result_variable: Option<String>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub username: Option<String>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub password: Option<String>,
}

impl ConnectorConfig {
  pub fn new(endpoint_url: impl Into<String>, payload_expression: impl Into<String>) -> Self {
    Self {
      endpoint_url: Some(endpoint_url.into()),
      payload_expression: Some(payload_expression.into()),
      ..Self::default()
    }
  }

  pub fn with_language(mut self, language: impl Into<String>) -> Self {
    self.language = Some(language.into());
    self
  }

  pub fn with_result_variable(mut self, result_variable: impl Into<String>) -> Self {
    self.result_variable = Some(result_variable.into());
    self
  }

  pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
    self.username = Some(username.into());
    self.password = Some(password.into());
    self
  }

  /// Check the definition-time rules.
  pub fn validate(&self) -> Result<(), ConfigError> {
    if is_blank(&self.endpoint_url) {
      return Err(ConfigError::MissingField {
        field: "endpoint_url",
      });
    }
    if is_blank(&self.payload_expression) {
      return Err(ConfigError::MissingField {
        field: "payload_expression",
      });
    }

    match (&self.username, &self.password) {
      (Some(_), None) => Err(ConfigError::UnpairedCredentials {
        present: "username",
        missing: "password",
      }),
      (None, Some(_)) => Err(ConfigError::UnpairedCredentials {
        present: "password",
        missing: "username",
      }),
      _ => Ok(()),
    }
  }
}

fn is_blank(slot: &Option<String>) -> bool {
  slot.as_deref().is_none_or(|s| s.trim().is_empty())
}
