//! Integration tests for SendTask against a real bus and a mock HTTP server.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::json;
use tasklink_bus::{Echo, Envelope, HandlerError, MessageBus, from_fn};
use tasklink_codec::{BincodeCodec, CodecError, PayloadCodec, Value};
use tasklink_config::ConnectorConfig;
use tasklink_connector::{
  CommandContext, ConnectorError, EngineContext, EngineServices, ExecutionContext, ExecutionError,
  InMemoryExecution, LegacyCompatibilityHandler, SendTask,
};
use tasklink_script::ScriptError;
use wiremock::matchers::{body_bytes, header, header_exists, method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

fn execution() -> InMemoryExecution {
  InMemoryExecution::new("exec-123", "order:1:7").with_variable("order_id", 42i64)
}

fn encode(value: &Value) -> Vec<u8> {
  BincodeCodec::new().encode(value).expect("encode")
}

/// Bus endpoint that counts requests and replies with a fixed value.
fn counting_endpoint(bus: &MessageBus, address: &str, reply: Value) -> Arc<AtomicUsize> {
  let calls = Arc::new(AtomicUsize::new(0));
  let counter = calls.clone();
  bus
    .bind(
      address,
      from_fn(move |_: &Envelope| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(reply.clone())
      }),
    )
    .expect("bind");
  calls
}

struct EchoBody;

impl Respond for EchoBody {
  fn respond(&self, request: &Request) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_bytes(request.body.clone())
  }
}

#[derive(Default)]
struct RecordingLegacy {
  evaluations: AtomicUsize,
  leaves: AtomicUsize,
}

struct SharedLegacy(Arc<RecordingLegacy>);

impl LegacyCompatibilityHandler for SharedLegacy {
  fn evaluate_script(
    &self,
    _script: &str,
    _language: &str,
    _execution: &dyn ExecutionContext,
  ) -> Result<Value, ScriptError> {
    self.0.evaluations.fetch_add(1, Ordering::SeqCst);
    Ok(Value::from("from-legacy"))
  }

  fn leave_execution(&self, _execution: &mut dyn ExecutionContext) -> Result<(), ExecutionError> {
    self.0.leaves.fetch_add(1, Ordering::SeqCst);
    Ok(())
  }
}

struct Command {
  legacy: bool,
}

impl CommandContext for Command {
  fn is_legacy_process_definition(&self, _process_definition_id: &str) -> bool {
    self.legacy
  }
}

struct FailingCodec;

impl PayloadCodec for FailingCodec {
  fn name(&self) -> &'static str {
    "failing"
  }

  fn content_type(&self) -> &'static str {
    "application/octet-stream"
  }

  fn encode(&self, _value: &Value) -> Result<Vec<u8>, CodecError> {
    Err(CodecError::encode("failing", "value not serializable"))
  }

  fn decode(&self, _bytes: &[u8]) -> Result<Value, CodecError> {
    Err(CodecError::decode("failing", "never"))
  }
}

#[tokio::test]
async fn test_bus_dispatch_binds_reply() {
  let bus = MessageBus::new();
  let calls = counting_endpoint(&bus, "vm:order.queue", Value::from("accepted"));
  let services = EngineServices::new().with_message_bus(bus);

  let config = ConnectorConfig::new("vm:order.queue", "{'id': order_id}").with_result_variable("reply");
  let task = SendTask::new("notify", config).unwrap();

  let mut execution = execution();
  task
    .execute(&mut execution, &EngineContext::new(&services))
    .await
    .expect("send should succeed");

  assert_eq!(calls.load(Ordering::SeqCst), 1);
  assert_eq!(execution.variable("reply"), Some(Value::from("accepted")));
  assert!(execution.has_left());
}

#[tokio::test]
async fn test_bus_payload_is_not_serialized() {
  let bus = MessageBus::new();
  bus.bind("vm:echo", Echo).unwrap();
  let services = EngineServices::new().with_message_bus(bus);

  let config = ConnectorConfig::new("vm:echo", "{'id': order_id, 'lines': [1, 2, 3]}")
    .with_result_variable("reply");
  let task = SendTask::new("echo", config).unwrap();

  let mut execution = execution();
  task
    .execute(&mut execution, &EngineContext::new(&services))
    .await
    .unwrap();

  assert_eq!(
    execution.variable("reply"),
    Some(Value::from(json!({"id": 42, "lines": [1, 2, 3]})))
  );
}

#[tokio::test]
async fn test_bus_endpoint_never_hits_http() {
  let server = MockServer::start().await;
  Mock::given(method("POST"))
    .respond_with(ResponseTemplate::new(200))
    .expect(0)
    .mount(&server)
    .await;

  let bus = MessageBus::new();
  bus.bind("vm:order.queue", Echo).unwrap();
  let services = EngineServices::new().with_message_bus(bus);

  let config = ConnectorConfig::new("vm:order.queue", "1");
  let task = SendTask::new("notify", config).unwrap();
  task
    .execute(&mut execution(), &EngineContext::new(&services))
    .await
    .unwrap();
}

#[tokio::test]
async fn test_http_endpoint_never_hits_bus() {
  let server = MockServer::start().await;
  Mock::given(method("POST"))
    .and(path("/svc"))
    .respond_with(ResponseTemplate::new(200))
    .expect(1)
    .mount(&server)
    .await;

  let bus = MessageBus::new();
  let calls = counting_endpoint(&bus, "vm:svc", Value::Null);
  let services = EngineServices::new().with_message_bus(bus);

  let config = ConnectorConfig::new(format!("{}/svc", server.uri()), "1");
  let task = SendTask::new("post", config).unwrap();
  task
    .execute(&mut execution(), &EngineContext::new(&services))
    .await
    .unwrap();

  assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_http_post_with_basic_auth() {
  let payload = Value::List(vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
  let reply = Value::from(json!({"status": "ok"}));

  let server = MockServer::start().await;
  Mock::given(method("POST"))
    .and(path("/svc"))
    .and(header("authorization", "Basic dTpw"))
    .and(header("content-type", BincodeCodec::CONTENT_TYPE))
    .and(body_bytes(encode(&payload)))
    .respond_with(ResponseTemplate::new(200).set_body_bytes(encode(&reply)))
    .expect(1)
    .mount(&server)
    .await;

  let services = EngineServices::new();
  let config = ConnectorConfig::new(format!("{}/svc", server.uri()), "[1, 2, 3]")
    .with_credentials("u", "p")
    .with_result_variable("reply");
  let task = SendTask::new("post", config).unwrap();

  let mut execution = execution();
  task
    .execute(&mut execution, &EngineContext::new(&services))
    .await
    .expect("post should succeed");

  assert_eq!(execution.variable("reply"), Some(reply));
  assert!(execution.has_left());
}

#[tokio::test]
async fn test_http_round_trip_through_echo() {
  let server = MockServer::start().await;
  Mock::given(method("POST"))
    .respond_with(EchoBody)
    .mount(&server)
    .await;

  let config = ConnectorConfig::new(server.uri(), r#"{"order": {"id": 42, "note": null, "tags": ["a", "b"]}, "lines": [[1, 2], []]}"#)
    .with_language("json")
    .with_result_variable("reply");
  let task = SendTask::new("echo", config).unwrap();

  let services = EngineServices::new();
  let mut execution = execution();
  task
    .execute(&mut execution, &EngineContext::new(&services))
    .await
    .unwrap();

  assert_eq!(
    execution.variable("reply"),
    Some(Value::from(json!({
      "order": {"id": 42, "note": null, "tags": ["a", "b"]},
      "lines": [[1, 2], []]
    })))
  );
}

#[tokio::test]
async fn test_one_sided_credentials_send_no_auth() {
  let server = MockServer::start().await;
  Mock::given(header_exists("authorization"))
    .respond_with(ResponseTemplate::new(500))
    .expect(0)
    .mount(&server)
    .await;
  Mock::given(method("POST"))
    .respond_with(ResponseTemplate::new(200))
    .expect(1)
    .mount(&server)
    .await;

  let mut config = ConnectorConfig::new(server.uri(), "1");
  config.username = Some("u".to_string());
  config.password = Some("{{ missing_password }}".to_string());
  let task = SendTask::new("post", config).unwrap();

  let services = EngineServices::new();
  task
    .execute(&mut execution(), &EngineContext::new(&services))
    .await
    .unwrap();
}

#[tokio::test]
async fn test_unreachable_host_is_transport_fault() {
  let config = ConnectorConfig::new("http://127.0.0.1:1/svc", "[1, 2, 3]")
    .with_credentials("u", "p")
    .with_result_variable("reply");
  let task = SendTask::new("post", config).unwrap();

  let services = EngineServices::new();
  let mut execution = execution();
  let err = task
    .execute(&mut execution, &EngineContext::new(&services))
    .await
    .unwrap_err();

  assert!(matches!(err, ConnectorError::HttpTransport { .. }));
  assert_eq!(execution.variable("reply"), None);
  assert!(!execution.has_left());
}

#[tokio::test]
async fn test_invalid_response_is_decoding_fault() {
  let server = MockServer::start().await;
  Mock::given(method("POST"))
    .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
    .mount(&server)
    .await;

  let config = ConnectorConfig::new(format!("{}/svc", server.uri()), "1").with_result_variable("reply");
  let task = SendTask::new("post", config).unwrap();

  let services = EngineServices::new();
  let mut execution = execution();
  let err = task
    .execute(&mut execution, &EngineContext::new(&services))
    .await
    .unwrap_err();

  assert!(matches!(err, ConnectorError::ResponseDecoding { .. }));
  assert_eq!(execution.variable("reply"), None);
  assert!(!execution.has_left());
}

#[tokio::test]
async fn test_deeply_nested_response_is_decoding_fault() {
  let mut body = BincodeCodec::MAGIC.to_vec();
  for _ in 0..200_000 {
    body.extend_from_slice(&6u32.to_le_bytes());
    body.extend_from_slice(&1u64.to_le_bytes());
  }
  body.extend_from_slice(&0u32.to_le_bytes());

  let server = MockServer::start().await;
  Mock::given(method("POST"))
    .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
    .expect(1)
    .mount(&server)
    .await;

  let config = ConnectorConfig::new(server.uri(), "1").with_result_variable("reply");
  let task = SendTask::new("post", config).unwrap();

  let services = EngineServices::new();
  let mut execution = execution();
  let err = task
    .execute(&mut execution, &EngineContext::new(&services))
    .await
    .unwrap_err();

  assert!(matches!(err, ConnectorError::ResponseDecoding { .. }));
  assert_eq!(execution.variable("reply"), None);
  assert!(!execution.has_left());
}

#[tokio::test]
async fn test_empty_response_binds_nothing() {
  let server = MockServer::start().await;
  Mock::given(method("POST"))
    .respond_with(ResponseTemplate::new(204))
    .mount(&server)
    .await;

  let config = ConnectorConfig::new(server.uri(), "1").with_result_variable("reply");
  let task = SendTask::new("post", config).unwrap();

  let services = EngineServices::new();
  let mut execution = execution();
  task
    .execute(&mut execution, &EngineContext::new(&services))
    .await
    .unwrap();

  assert_eq!(execution.variable("reply"), None);
  assert!(execution.has_left());
}

#[tokio::test]
async fn test_encoding_fault_sends_nothing() {
  let server = MockServer::start().await;
  Mock::given(method("POST"))
    .respond_with(ResponseTemplate::new(200))
    .expect(0)
    .mount(&server)
    .await;

  let config = ConnectorConfig::new(server.uri(), "1");
  let task = SendTask::new("post", config)
    .unwrap()
    .with_codec(FailingCodec);

  let services = EngineServices::new();
  let err = task
    .execute(&mut execution(), &EngineContext::new(&services))
    .await
    .unwrap_err();

  assert!(matches!(err, ConnectorError::PayloadEncoding { .. }));
}

#[tokio::test]
async fn test_malformed_endpoint_is_named() {
  let config = ConnectorConfig::new("not a url", "1");
  let task = SendTask::new("post", config).unwrap();

  let services = EngineServices::new();
  let err = task
    .execute(&mut execution(), &EngineContext::new(&services))
    .await
    .unwrap_err();

  assert!(matches!(&err, ConnectorError::InvalidEndpoint { endpoint, .. } if endpoint == "not a url"));
}

#[tokio::test]
async fn test_no_result_variable_leaves_scope_unchanged() {
  let bus = MessageBus::new();
  bus.bind("vm:echo", Echo).unwrap();
  bus
    .bind(
      "vm:reject",
      from_fn(|_: &Envelope| Err(HandlerError::new("rejected"))),
    )
    .unwrap();
  let services = EngineServices::new().with_message_bus(bus);

  for endpoint in ["vm:echo", "vm:reject"] {
    let task = SendTask::new("notify", ConnectorConfig::new(endpoint, "order_id")).unwrap();
    let mut execution = execution();
    let before = execution.variables();

    let _ = task
      .execute(&mut execution, &EngineContext::new(&services))
      .await;

    assert_eq!(execution.variables(), before, "endpoint {}", endpoint);
  }
}

#[tokio::test]
async fn test_bus_handler_failure_is_transport_fault() {
  let bus = MessageBus::new();
  bus
    .bind(
      "vm:reject",
      from_fn(|_: &Envelope| Err(HandlerError::new("rejected"))),
    )
    .unwrap();
  let services = EngineServices::new().with_message_bus(bus);

  let config = ConnectorConfig::new("vm:reject", "1").with_result_variable("reply");
  let task = SendTask::new("notify", config).unwrap();

  let mut execution = execution();
  let err = task
    .execute(&mut execution, &EngineContext::new(&services))
    .await
    .unwrap_err();

  assert!(matches!(err, ConnectorError::BusTransport { .. }));
  assert_eq!(execution.variable("reply"), None);
  assert!(!execution.has_left());
}

#[tokio::test]
async fn test_unbound_bus_address_is_transport_fault() {
  let services = EngineServices::new().with_message_bus(MessageBus::new());
  let task = SendTask::new("notify", ConnectorConfig::new("vm:nowhere", "1")).unwrap();

  let err = task
    .execute(&mut execution(), &EngineContext::new(&services))
    .await
    .unwrap_err();
  assert!(matches!(err, ConnectorError::BusTransport { endpoint, .. } if endpoint == "vm:nowhere"));
}

#[tokio::test]
async fn test_bus_without_message_bus() {
  let services = EngineServices::new();
  let task = SendTask::new("notify", ConnectorConfig::new("vm:q", "1")).unwrap();

  let err = task
    .execute(&mut execution(), &EngineContext::new(&services))
    .await
    .unwrap_err();
  assert!(matches!(err, ConnectorError::BusUnavailable));
}

#[tokio::test]
async fn test_null_reply_sets_variable_to_null() {
  let bus = MessageBus::new();
  counting_endpoint(&bus, "vm:void", Value::Null);
  let services = EngineServices::new().with_message_bus(bus);

  let config = ConnectorConfig::new("vm:void", "1").with_result_variable("reply");
  let task = SendTask::new("notify", config).unwrap();

  let mut execution = execution();
  task
    .execute(&mut execution, &EngineContext::new(&services))
    .await
    .unwrap();

  assert_eq!(execution.variable("reply"), Some(Value::Null));
}

#[tokio::test]
async fn test_payload_evaluation_fault() {
  let services = EngineServices::new().with_message_bus(MessageBus::new());
  let config = ConnectorConfig::new("vm:q", "order_id +").with_result_variable("reply");
  let task = SendTask::new("notify", config).unwrap();

  let mut execution = execution();
  let err = task
    .execute(&mut execution, &EngineContext::new(&services))
    .await
    .unwrap_err();

  assert!(matches!(err, ConnectorError::Script { .. }));
  assert!(!execution.has_left());
}

#[tokio::test]
async fn test_legacy_without_command_evaluates_and_completes_via_handler() {
  let bus = MessageBus::new();
  bus.bind("vm:echo", Echo).unwrap();
  let legacy = Arc::new(RecordingLegacy::default());
  let services = EngineServices::new()
    .with_message_bus(bus)
    .with_legacy_handler(SharedLegacy(legacy.clone()));

  let config = ConnectorConfig::new("vm:echo", "order_id").with_result_variable("reply");
  let task = SendTask::new("notify", config).unwrap();

  let mut execution = execution();
  task
    .execute(&mut execution, &EngineContext::new(&services))
    .await
    .unwrap();

  assert_eq!(execution.variable("reply"), Some(Value::from("from-legacy")));
  assert_eq!(legacy.evaluations.load(Ordering::SeqCst), 1);
  assert_eq!(legacy.leaves.load(Ordering::SeqCst), 1);
  assert!(!execution.has_left());
}

#[tokio::test]
async fn test_legacy_command_evaluates_and_completes_via_handler() {
  let bus = MessageBus::new();
  bus.bind("vm:echo", Echo).unwrap();
  let legacy = Arc::new(RecordingLegacy::default());
  let services = EngineServices::new()
    .with_message_bus(bus)
    .with_legacy_handler(SharedLegacy(legacy.clone()));
  let command = Command { legacy: true };

  let config = ConnectorConfig::new("vm:echo", "order_id").with_result_variable("reply");
  let task = SendTask::new("notify", config).unwrap();

  let mut execution = execution();
  task
    .execute(
      &mut execution,
      &EngineContext::new(&services).with_command(&command),
    )
    .await
    .unwrap();

  assert_eq!(execution.variable("reply"), Some(Value::from("from-legacy")));
  assert_eq!(legacy.evaluations.load(Ordering::SeqCst), 1);
  assert_eq!(legacy.leaves.load(Ordering::SeqCst), 1);
  assert!(!execution.has_left());
}

#[tokio::test]
async fn test_current_command_ignores_legacy_handler() {
  let bus = MessageBus::new();
  bus.bind("vm:echo", Echo).unwrap();
  let legacy = Arc::new(RecordingLegacy::default());
  let services = EngineServices::new()
    .with_message_bus(bus)
    .with_legacy_handler(SharedLegacy(legacy.clone()));
  let command = Command { legacy: false };

  let config = ConnectorConfig::new("vm:echo", "order_id").with_result_variable("reply");
  let task = SendTask::new("notify", config).unwrap();

  let mut execution = execution();
  task
    .execute(
      &mut execution,
      &EngineContext::new(&services).with_command(&command),
    )
    .await
    .unwrap();

  assert_eq!(execution.variable("reply"), Some(Value::Int(42)));
  assert_eq!(legacy.evaluations.load(Ordering::SeqCst), 0);
  assert_eq!(legacy.leaves.load(Ordering::SeqCst), 0);
  assert!(execution.has_left());
}

#[tokio::test]
async fn test_legacy_command_without_handler_fails() {
  let services = EngineServices::new().with_message_bus(MessageBus::new());
  let command = Command { legacy: true };
  let task = SendTask::new("notify", ConnectorConfig::new("vm:q", "1")).unwrap();

  let err = task
    .execute(
      &mut execution(),
      &EngineContext::new(&services).with_command(&command),
    )
    .await
    .unwrap_err();
  assert!(matches!(err, ConnectorError::LegacyHandlerMissing { .. }));
}

#[tokio::test]
async fn test_concurrent_invocations_share_task() {
  let bus = MessageBus::new();
  bus.bind("vm:echo", Echo).unwrap();
  let services = EngineServices::new().with_message_bus(bus);

  let config = ConnectorConfig::new("vm:echo", "order_id").with_result_variable("reply");
  let task = SendTask::new("notify", config).unwrap();
  let engine = EngineContext::new(&services);

  let mut first = InMemoryExecution::new("exec-1", "order:1:7").with_variable("order_id", 1i64);
  let mut second = InMemoryExecution::new("exec-2", "order:1:7").with_variable("order_id", 2i64);
  let mut third = InMemoryExecution::new("exec-3", "order:1:7").with_variable("order_id", 3i64);

  let (a, b, c) = tokio::join!(
    task.execute(&mut first, &engine),
    task.execute(&mut second, &engine),
    task.execute(&mut third, &engine),
  );
  a.unwrap();
  b.unwrap();
  c.unwrap();

  assert_eq!(first.variable("reply"), Some(Value::Int(1)));
  assert_eq!(second.variable("reply"), Some(Value::Int(2)));
  assert_eq!(third.variable("reply"), Some(Value::Int(3)));
}
