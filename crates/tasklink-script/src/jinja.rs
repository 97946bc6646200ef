//! minijinja-backed evaluation.
//!
//! Variables are exposed to minijinja through their JSON form, and results are
//! read back the same way. `none` and undefined values become [`Value::Null`].

use std::collections::BTreeMap;

use minijinja::{Environment, ErrorKind};

use crate::engines::ScriptEngine;
use crate::error::ScriptError;
use crate::{Bindings, Value};

const JINJA: &str = "jinja";

/// Evaluates payload scripts as minijinja expressions, e.g.
/// `{ 'id': order.id, 'lines': order.lines | length }`.
pub struct JinjaEngine {
  env: Environment<'static>,
}

impl JinjaEngine {
  pub fn new() -> Self {
    Self {
      env: Environment::new(),
    }
  }
}

impl Default for JinjaEngine {
  fn default() -> Self {
    Self::new()
  }
}

impl ScriptEngine for JinjaEngine {
  fn evaluate(&self, script: &str, bindings: &Bindings) -> Result<Value, ScriptError> {
    eval_expression(&self.env, script, bindings)
  }
}

/// Parses the script as a literal JSON document.
pub struct JsonEngine;

impl ScriptEngine for JsonEngine {
  fn evaluate(&self, script: &str, _bindings: &Bindings) -> Result<Value, ScriptError> {
    serde_json::from_str::<serde_json::Value>(script)
      .map(Value::from)
      .map_err(|e| ScriptError::syntax("json", e.to_string()))
  }
}

/// Evaluate a field expression.
///
/// - Text that is exactly one `{{ expr }}` block keeps the expression's type.
/// - Other text with template syntax renders to a string.
/// - Text without template syntax is a literal string.
pub fn evaluate_template(text: &str, bindings: &Bindings) -> Result<Value, ScriptError> {
  let env = Environment::new();

  if let Some(expr) = single_expression(text) {
    return eval_expression(&env, expr, bindings);
  }

  if !(text.contains("{{") || text.contains("{%")) {
    return Ok(Value::String(text.to_string()));
  }

  env
    .render_str(text, json_context(bindings))
    .map(Value::String)
    .map_err(|e| map_error(&e))
}

/// Returns the inner expression when `text` is a single `{{ ... }}` block.
fn single_expression(text: &str) -> Option<&str> {
  let inner = text.trim().strip_prefix("{{")?.strip_suffix("}}")?;
  if inner.contains("{{") || inner.contains("}}") {
    return None;
  }
  Some(inner.trim())
}

fn eval_expression(env: &Environment, expr: &str, bindings: &Bindings) -> Result<Value, ScriptError> {
  let compiled = env.compile_expression(expr).map_err(|e| map_error(&e))?;
  let result = compiled
    .eval(json_context(bindings))
    .map_err(|e| map_error(&e))?;

  if result.is_undefined() || result.is_none() {
    return Ok(Value::Null);
  }

  serde_json::to_value(&result)
    .map(Value::from)
    .map_err(|e| ScriptError::evaluation(JINJA, format!("unrepresentable result: {}", e)))
}

fn json_context(bindings: &Bindings) -> BTreeMap<&str, serde_json::Value> {
  bindings
    .iter()
    .map(|(name, value)| (name.as_str(), value.to_json()))
    .collect()
}

fn map_error(e: &minijinja::Error) -> ScriptError {
  match e.kind() {
    ErrorKind::SyntaxError => ScriptError::syntax(JINJA, e.to_string()),
    _ => ScriptError::evaluation(JINJA, e.to_string()),
  }
}
