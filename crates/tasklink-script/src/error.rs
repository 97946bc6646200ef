use thiserror::Error;

/// Errors raised while evaluating a script or field expression.
#[derive(Debug, Error)]
pub enum ScriptError {
  /// No engine is registered for the language.
  #[error("no scripting engine registered for language '{language}'")]
  UnknownLanguage { language: String },

  /// The script could not be parsed.
  #[error("{language} syntax error: {message}")]
  Syntax { language: String, message: String },

  /// The script parsed but failed while running.
  #[error("{language} evaluation failed: {message}")]
  Evaluation { language: String, message: String },
}

impl ScriptError {
  pub fn syntax(language: impl Into<String>, message: impl Into<String>) -> Self {
    Self::Syntax {
      language: language.into(),
      message: message.into(),
    }
  }

  pub fn evaluation(language: impl Into<String>, message: impl Into<String>) -> Self {
    Self::Evaluation {
      language: language.into(),
      message: message.into(),
    }
  }
}
