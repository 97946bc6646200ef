//! Engine-provided collaborators.

use std::sync::Arc;

use tasklink_bus::MessageBus;
use tasklink_script::{ScriptError, ScriptingEngines, Value};

use crate::error::ExecutionError;
use crate::execution::ExecutionContext;

/// Runs executions of process definitions authored for the previous engine generation.
pub trait LegacyCompatibilityHandler: Send + Sync {
  /// Evaluate a payload script the way the legacy engine does.
  fn evaluate_script(
    &self,
    script: &str,
    language: &str,
    execution: &dyn ExecutionContext,
  ) -> Result<Value, ScriptError>;

  /// Advance a legacy execution past the current task.
  fn leave_execution(&self, execution: &mut dyn ExecutionContext) -> Result<(), ExecutionError>;
}

/// The engine's active command, when the task runs inside one.
pub trait CommandContext: Send + Sync {
  /// Whether the process definition was authored for the legacy engine generation.
  fn is_legacy_process_definition(&self, process_definition_id: &str) -> bool;
}

/// Long-lived engine services shared by every invocation.
#[derive(Clone)]
pub struct EngineServices {
  scripting: ScriptingEngines,
  message_bus: Option<MessageBus>,
  legacy_handler: Option<Arc<dyn LegacyCompatibilityHandler>>,
}

impl EngineServices {
  /// Services with the built-in scripting languages, no bus and no legacy handler.
  pub fn new() -> Self {
    Self {
      scripting: ScriptingEngines::with_defaults(),
      message_bus: None,
      legacy_handler: None,
    }
  }

  pub fn with_scripting(mut self, scripting: ScriptingEngines) -> Self {
    self.scripting = scripting;
    self
  }

  pub fn with_message_bus(mut self, bus: MessageBus) -> Self {
    self.message_bus = Some(bus);
    self
  }

  pub fn with_legacy_handler(mut self, handler: impl LegacyCompatibilityHandler + 'static) -> Self {
    self.legacy_handler = Some(Arc::new(handler));
    self
  }

  pub fn scripting(&self) -> &ScriptingEngines {
    &self.scripting
  }

  pub fn message_bus(&self) -> Option<&MessageBus> {
    self.message_bus.as_ref()
  }

  pub fn legacy_handler(&self) -> Option<&Arc<dyn LegacyCompatibilityHandler>> {
    self.legacy_handler.as_ref()
  }
}

impl Default for EngineServices {
  fn default() -> Self {
    Self::new()
  }
}

/// What the engine hands a task for one invocation besides the execution.
#[derive(Clone, Copy)]
pub struct EngineContext<'a> {
  services: &'a EngineServices,
  command: Option<&'a dyn CommandContext>,
}

impl<'a> EngineContext<'a> {
  /// Context for a call made outside any engine command.
  pub fn new(services: &'a EngineServices) -> Self {
    Self {
      services,
      command: None,
    }
  }

  pub fn with_command(mut self, command: &'a dyn CommandContext) -> Self {
    self.command = Some(command);
    self
  }

  pub fn services(&self) -> &'a EngineServices {
    self.services
  }

  pub fn command(&self) -> Option<&'a dyn CommandContext> {
    self.command
  }
}
