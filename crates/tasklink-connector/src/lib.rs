//! Send task connector for tasklink.
//!
//! A [`SendTask`] evaluates a payload expression against the current
//! execution, sends the payload to an endpoint and stores the reply in a
//! workflow variable.
//!
//! # Flow
//!
//! ```text
//! SendTask::execute(execution, engine)
//! ├── ResolvedInvocation::resolve      - six field expressions -> text
//! ├── EngineGeneration::select         - current or legacy, decided once
//! │   └── evaluate_payload             - scripting engines or legacy handler
//! ├── Transport::for_endpoint          - "vm:" -> bus, otherwise HTTP
//! │   ├── BusDispatcher::dispatch      - in-memory request/reply
//! │   └── HttpDispatcher::dispatch     - codec-encoded POST, decoded reply
//! ├── bind_result                      - set the result variable
//! └── EngineGeneration::complete       - leave() or legacy leave_execution()
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use tasklink_config::ConnectorConfig;
//! use tasklink_connector::{EngineContext, EngineServices, InMemoryExecution, SendTask};
//!
//! let config = ConnectorConfig::new("vm:order.queue", "{'id': order_id}")
//!   .with_result_variable("reply");
//! let task = SendTask::new("notify_warehouse", config)?;
//!
//! let services = EngineServices::new().with_message_bus(bus);
//! let mut execution = InMemoryExecution::new("exec-1", "order:1:7");
//! task.execute(&mut execution, &EngineContext::new(&services)).await?;
//! ```

mod binder;
mod bus;
mod error;
mod execution;
mod generation;
mod http;
mod resolve;
mod services;
mod task;
mod transport;

pub use binder::bind_result;
pub use bus::BusDispatcher;
pub use error::{ConnectorError, ExecutionError};
pub use execution::{ExecutionContext, InMemoryExecution};
pub use generation::EngineGeneration;
pub use http::{Credentials, HttpDispatcher};
pub use resolve::{ResolvedInvocation, resolve_field};
pub use services::{CommandContext, EngineContext, EngineServices, LegacyCompatibilityHandler};
pub use task::SendTask;
pub use transport::Transport;
