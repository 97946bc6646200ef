//! Scripting engine registry.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::error::ScriptError;
use crate::jinja::{JinjaEngine, JsonEngine};
use crate::{Bindings, Value};

/// Language used when a task does not name one.
pub const DEFAULT_LANGUAGE: &str = "jinja";

/// A scripting language implementation.
pub trait ScriptEngine: Send + Sync {
  /// Evaluate `script` with `bindings` in scope and return its value.
  fn evaluate(&self, script: &str, bindings: &Bindings) -> Result<Value, ScriptError>;
}

/// Engines registered by language name.
///
/// Language names are matched case-insensitively.
#[derive(Clone, Default)]
pub struct ScriptingEngines {
  engines: HashMap<String, Arc<dyn ScriptEngine>>,
}

impl ScriptingEngines {
  /// An empty registry.
  pub fn new() -> Self {
    Self::default()
  }

  /// A registry with every built-in language.
  pub fn with_defaults() -> Self {
    let mut engines = Self::new();
    engines.register("jinja", JinjaEngine::new());
    engines.register("json", JsonEngine);
    #[cfg(feature = "lua")]
    engines.register("lua", crate::lua::LuaEngine);
    engines
  }

  /// Register an engine, replacing any engine already bound to the language.
  pub fn register(&mut self, language: &str, engine: impl ScriptEngine + 'static) {
    self
      .engines
      .insert(language.to_ascii_lowercase(), Arc::new(engine));
  }

  pub fn supports(&self, language: &str) -> bool {
    self.engines.contains_key(&language.to_ascii_lowercase())
  }

  /// Registered language names, sorted.
  pub fn languages(&self) -> Vec<String> {
    let mut names: Vec<String> = self.engines.keys().cloned().collect();
    names.sort();
    names
  }

  /// Evaluate `script` in `language`.
  pub fn evaluate(
    &self,
    script: &str,
    language: &str,
    bindings: &Bindings,
  ) -> Result<Value, ScriptError> {
    let engine = self
      .engines
      .get(&language.to_ascii_lowercase())
      .ok_or_else(|| ScriptError::UnknownLanguage {
        language: language.to_string(),
      })?;

    debug!(language, variables = bindings.len(), "evaluating script");
    engine.evaluate(script, bindings)
  }
}

impl std::fmt::Debug for ScriptingEngines {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("ScriptingEngines")
      .field("languages", &self.languages())
      .finish()
  }
}
