use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::connector::ConnectorConfig;
use crate::error::ConfigError;

/// A send task as it appears in a task definition file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendTaskDef {
  pub task_id: String,

  /// Process definition the task belongs to. Used to decide whether the
  /// execution runs against the legacy engine generation.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub process_definition_id: Option<String>,

  pub config: ConnectorConfig,

  /// Bus addresses that echo requests back, bound before the task runs.
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub bus_echo: Vec<String>,
}

impl SendTaskDef {
  /// Parse and validate a definition from JSON text.
  pub fn from_json(text: &str) -> Result<Self, ConfigError> {
    let def: SendTaskDef = serde_json::from_str(text)?;
    def.config.validate()?;
    Ok(def)
  }

  /// Read, parse and validate a definition file.
  pub fn load(path: &Path) -> Result<Self, std::io::Error> {
    let text = std::fs::read_to_string(path)?;
    Self::from_json(&text).map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
  }
}
