//! The execution a send task runs against.

use tasklink_script::{Bindings, Value, evaluate_template};

use crate::error::ExecutionError;

/// A workflow execution as seen by a task.
///
/// The engine owns the execution; a task borrows it for one invocation.
pub trait ExecutionContext: Send + Sync {
  fn execution_id(&self) -> &str;

  fn process_definition_id(&self) -> &str;

  /// Snapshot of the variables in scope.
  fn variables(&self) -> Bindings;

  fn variable(&self, name: &str) -> Option<Value> {
    self.variables().remove(name)
  }

  /// Set a variable. A `Null` value sets the variable to null; it does not remove it.
  fn set_variable(&mut self, name: &str, value: Value);

  /// Evaluate a field expression against the variables in scope.
  fn evaluate(&self, expression: &str) -> Result<Value, ExecutionError> {
    evaluate_template(expression, &self.variables()).map_err(|source| ExecutionError::Expression {
      expression: expression.to_string(),
      source,
    })
  }

  /// Advance the workflow past the current task.
  fn leave(&mut self) -> Result<(), ExecutionError>;
}

/// Execution backed by an in-memory variable map.
///
/// Used by the CLI and by embedders that drive tasks directly.
#[derive(Debug, Clone, Default)]
pub struct InMemoryExecution {
  execution_id: String,
  process_definition_id: String,
  variables: Bindings,
  left: bool,
}

impl InMemoryExecution {
  pub fn new(execution_id: impl Into<String>, process_definition_id: impl Into<String>) -> Self {
    Self {
      execution_id: execution_id.into(),
      process_definition_id: process_definition_id.into(),
      variables: Bindings::new(),
      left: false,
    }
  }

  pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
    self.variables.insert(name.into(), value.into());
    self
  }

  pub fn with_variables(mut self, variables: Bindings) -> Self {
    self.variables.extend(variables);
    self
  }

  /// Whether [`ExecutionContext::leave`] has been called.
  pub fn has_left(&self) -> bool {
    self.left
  }

  pub fn into_variables(self) -> Bindings {
    self.variables
  }
}

impl ExecutionContext for InMemoryExecution {
  fn execution_id(&self) -> &str {
    &self.execution_id
  }

  fn process_definition_id(&self) -> &str {
    &self.process_definition_id
  }

  fn variables(&self) -> Bindings {
    self.variables.clone()
  }

  fn variable(&self, name: &str) -> Option<Value> {
    self.variables.get(name).cloned()
  }

  fn set_variable(&mut self, name: &str, value: Value) {
    self.variables.insert(name.to_string(), value);
  }

  fn leave(&mut self) -> Result<(), ExecutionError> {
    if self.left {
      return Err(ExecutionError::Leave {
        execution_id: self.execution_id.clone(),
        message: "execution already left the task".to_string(),
      });
    }
    self.left = true;
    Ok(())
  }
}
