//! Current vs legacy engine generation.
//!
//! The generation is picked once per invocation. Payload evaluation and
//! completion both go through the same [`EngineGeneration`] value, so an
//! invocation never evaluates through one generation and completes through
//! the other.

use std::sync::Arc;

use tasklink_script::Value;
use tracing::debug;

use crate::error::ConnectorError;
use crate::execution::ExecutionContext;
use crate::services::{EngineContext, EngineServices, LegacyCompatibilityHandler};

#[derive(Clone)]
pub enum EngineGeneration {
  Current,
  Legacy(Arc<dyn LegacyCompatibilityHandler>),
}

impl EngineGeneration {
  /// Pick the generation for an execution of `process_definition_id`.
  ///
  /// - Inside a command: legacy when the command flags the definition as legacy.
  /// - Outside a command: legacy whenever a compatibility handler is registered,
  ///   since the definition cannot be checked.
  pub fn select(
    engine: &EngineContext<'_>,
    process_definition_id: &str,
  ) -> Result<Self, ConnectorError> {
    let handler = engine.services().legacy_handler().cloned();

    let generation = match engine.command() {
      Some(command) if command.is_legacy_process_definition(process_definition_id) => {
        let handler = handler.ok_or_else(|| ConnectorError::LegacyHandlerMissing {
          process_definition_id: process_definition_id.to_string(),
        })?;
        EngineGeneration::Legacy(handler)
      }
      Some(_) => EngineGeneration::Current,
      None => match handler {
        Some(handler) => EngineGeneration::Legacy(handler),
        None => EngineGeneration::Current,
      },
    };

    debug!(
      process_definition_id,
      legacy = generation.is_legacy(),
      in_command = engine.command().is_some(),
      "engine generation selected"
    );
    Ok(generation)
  }

  pub fn is_legacy(&self) -> bool {
    matches!(self, EngineGeneration::Legacy(_))
  }

  /// Evaluate the payload script.
  pub fn evaluate_payload(
    &self,
    services: &EngineServices,
    script: &str,
    language: &str,
    execution: &dyn ExecutionContext,
  ) -> Result<Value, ConnectorError> {
    let result = match self {
      EngineGeneration::Current => {
        services
          .scripting()
          .evaluate(script, language, &execution.variables())
      }
      EngineGeneration::Legacy(handler) => handler.evaluate_script(script, language, execution),
    };

    result.map_err(|source| ConnectorError::Script {
      language: language.to_string(),
      source,
    })
  }

  /// Signal the engine that the task is done.
  pub fn complete(&self, execution: &mut dyn ExecutionContext) -> Result<(), ConnectorError> {
    let result = match self {
      EngineGeneration::Current => execution.leave(),
      EngineGeneration::Legacy(handler) => handler.leave_execution(execution),
    };

    result.map_err(|source| ConnectorError::Completion { source })
  }
}

impl std::fmt::Debug for EngineGeneration {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      EngineGeneration::Current => f.write_str("Current"),
      EngineGeneration::Legacy(_) => f.write_str("Legacy"),
    }
  }
}
