use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("required field '{field}' is missing")]
  MissingField { field: &'static str },

  #[error("'{present}' is set but '{missing}' is not; credentials must be configured together")]
  UnpairedCredentials {
    present: &'static str,
    missing: &'static str,
  },

  #[error("failed to parse task definition: {0}")]
  Parse(#[from] serde_json::Error),
}
