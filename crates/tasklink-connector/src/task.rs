//! The send task.

use std::sync::Arc;

use tasklink_codec::PayloadCodec;
use tasklink_config::{ConfigError, ConnectorConfig};
use tracing::{error, info, instrument};

use crate::binder::bind_result;
use crate::bus::BusDispatcher;
use crate::error::ConnectorError;
use crate::execution::ExecutionContext;
use crate::generation::EngineGeneration;
use crate::http::HttpDispatcher;
use crate::resolve::ResolvedInvocation;
use crate::services::EngineContext;
use crate::transport::Transport;

/// A task that sends a computed payload to an endpoint and captures the reply.
///
/// One `SendTask` is attached to a task definition and shared by every
/// execution of it; [`SendTask::execute`] may run concurrently.
#[derive(Debug)]
pub struct SendTask {
  task_id: String,
  config: Arc<ConnectorConfig>,
  bus: BusDispatcher,
  http: HttpDispatcher,
}

impl SendTask {
  /// Attach `config` to a task. The config is validated and frozen.
  pub fn new(task_id: impl Into<String>, config: ConnectorConfig) -> Result<Self, ConfigError> {
    config.validate()?;
    Ok(Self {
      task_id: task_id.into(),
      config: Arc::new(config),
      bus: BusDispatcher::new(),
      http: HttpDispatcher::default(),
    })
  }

  /// Use `codec` for the HTTP transport instead of the default bincode codec.
  pub fn with_codec(mut self, codec: impl PayloadCodec + 'static) -> Self {
    self.http = HttpDispatcher::new(Arc::new(codec));
    self
  }

  pub fn task_id(&self) -> &str {
    &self.task_id
  }

  pub fn config(&self) -> &ConnectorConfig {
    &self.config
  }

  /// Run the task once for `execution`.
  ///
  /// On success the execution has been advanced through exactly one of
  /// [`ExecutionContext::leave`] or the legacy handler's `leave_execution`.
  /// On error the execution is not advanced.
  #[instrument(
    name = "send_task_execute",
    skip_all,
    fields(
      task_id = %self.task_id,
      execution_id = %execution.execution_id(),
      process_definition_id = %execution.process_definition_id(),
    )
  )]
  pub async fn execute(
    &self,
    execution: &mut dyn ExecutionContext,
    engine: &EngineContext<'_>,
  ) -> Result<(), ConnectorError> {
    info!("send task started");

    let result = self.execute_inner(execution, engine).await;

    match &result {
      Ok(()) => info!("send task completed"),
      Err(e) => error!(error = %e, "send task failed"),
    }

    result
  }

  async fn execute_inner(
    &self,
    execution: &mut dyn ExecutionContext,
    engine: &EngineContext<'_>,
  ) -> Result<(), ConnectorError> {
    let mut invocation = ResolvedInvocation::resolve(&self.config, &*execution)?;
    let endpoint = invocation.endpoint_url()?.to_string();
    let script = invocation.payload_expression()?.to_string();

    let generation = EngineGeneration::select(engine, execution.process_definition_id())?;
    invocation.payload = generation.evaluate_payload(
      engine.services(),
      &script,
      invocation.language(),
      &*execution,
    )?;

    let transport = Transport::for_endpoint(&endpoint);
    info!(
      endpoint = %endpoint,
      transport = ?transport,
      legacy = generation.is_legacy(),
      "dispatching payload"
    );

    let reply = match transport {
      Transport::Bus => {
        let payload = std::mem::take(&mut invocation.payload);
        Some(self.bus.dispatch(engine.services(), &endpoint, payload).await?)
      }
      Transport::Http => {
        self
          .http
          .dispatch(&endpoint, &invocation.payload, invocation.credentials())
          .await?
      }
    };

    if let Some(value) = reply {
      bind_result(execution, invocation.result_variable(), value);
    }

    generation.complete(execution)
  }
}
