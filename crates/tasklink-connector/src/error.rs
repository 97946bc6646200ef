//! Connector errors.
//!
//! Every variant is terminal for the invocation that raised it. Nothing is
//! retried here; the embedding engine owns retry and compensation.

use tasklink_bus::BusError;
use tasklink_codec::CodecError;
use tasklink_script::ScriptError;

/// Errors raised by the execution a task runs against.
#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
  /// A field expression could not be evaluated.
  #[error("expression '{expression}' failed: {source}")]
  Expression {
    expression: String,
    #[source]
    source: ScriptError,
  },

  /// The execution could not be advanced past the task.
  #[error("execution '{execution_id}' cannot leave: {message}")]
  Leave {
    execution_id: String,
    message: String,
  },
}

/// Errors that fail a send task invocation.
#[derive(Debug, thiserror::Error)]
pub enum ConnectorError {
  /// A required field resolved to nothing.
  #[error("field '{field}' resolved to no value")]
  MissingField { field: &'static str },

  /// A field expression failed to evaluate.
  #[error("failed to evaluate field '{field}'")]
  Evaluation {
    field: &'static str,
    #[source]
    source: ExecutionError,
  },

  /// The payload script failed to evaluate.
  #[error("failed to evaluate payload expression in '{language}'")]
  Script {
    language: String,
    #[source]
    source: ScriptError,
  },

  /// The process definition is legacy but no compatibility handler is registered.
  #[error("process definition '{process_definition_id}' is legacy but no compatibility handler is registered")]
  LegacyHandlerMissing { process_definition_id: String },

  /// A bus endpoint was addressed but the engine has no message bus.
  #[error("no message bus is configured for bus endpoints")]
  BusUnavailable,

  /// Sending over the bus or waiting for the reply failed.
  #[error("bus transport to '{endpoint}' failed")]
  BusTransport {
    endpoint: String,
    #[source]
    source: BusError,
  },

  /// The endpoint address is not usable by the selected transport.
  #[error("invalid endpoint address '{endpoint}': {message}")]
  InvalidEndpoint { endpoint: String, message: String },

  /// The outbound payload could not be encoded.
  #[error("error setting message payload")]
  PayloadEncoding {
    #[source]
    source: CodecError,
  },

  /// The HTTP request could not be sent or its response not read.
  #[error("http transport to '{endpoint}' failed")]
  HttpTransport {
    endpoint: String,
    #[source]
    source: reqwest::Error,
  },

  /// The response body is not a valid encoding.
  #[error("failed to read response value from '{endpoint}'")]
  ResponseDecoding {
    endpoint: String,
    #[source]
    source: CodecError,
  },

  /// Signalling completion to the engine failed.
  #[error("failed to complete execution")]
  Completion {
    #[source]
    source: ExecutionError,
  },
}
