use tasklink_script::Value;
use tracing::debug;

use crate::execution::ExecutionContext;

/// Store `value` under `result_variable`, if one was resolved.
///
/// A `Null` value sets the variable to null.
pub fn bind_result(execution: &mut dyn ExecutionContext, result_variable: Option<&str>, value: Value) {
  match result_variable {
    Some(name) if !name.is_empty() => {
      debug!(variable = name, "binding result");
      execution.set_variable(name, value);
    }
    _ => {}
  }
}
