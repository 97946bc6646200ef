//! Tasklink Config
//!
//! This crate contains the serializable configuration types for a send task.
//! A [`ConnectorConfig`] holds six expression slots. Each slot is an
//! expression string resolved against the execution at invocation time.
//!
//! Configuration can be loaded from:
//! - JSON task definition files (via CLI with `tasklink run task.json`)
//! - Any serde source the embedding engine uses
//!
//! # Example
//!
//! ```json
//! {
//!   "task_id": "notify_warehouse",
//!   "process_definition_id": "order:3:1207",
//!   "config": {
//!     "endpoint_url": "vm:order.queue",
//!     "language": "jinja",
//!     "payload_expression": "{ 'id': order_id }",
//!     "result_variable": "reply"
//!   }
//! }
//! ```

mod connector;
mod error;
mod task;

pub use connector::ConnectorConfig;
pub use error::ConfigError;
pub use task::SendTaskDef;
