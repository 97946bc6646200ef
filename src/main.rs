use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use tasklink_bus::{Echo, MessageBus};
use tasklink_codec::Value;
use tasklink_config::SendTaskDef;
use tasklink_connector::{EngineContext, EngineServices, InMemoryExecution, SendTask};

/// Tasklink - send task payloads over the in-process bus or HTTP
#[derive(Parser)]
#[command(name = "tasklink")]
#[command(version, about, long_about = None)]
struct Cli {
  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
  /// Run a send task once, reading process variables as JSON from stdin
  Run {
    /// Path to the task definition file (JSON)
    task_file: PathBuf,

    /// Execution id to report in logs (default: random)
    #[arg(long)]
    execution_id: Option<String>,
  },

  /// Check a task definition without running it
  Validate {
    /// Path to the task definition file (JSON)
    task_file: PathBuf,
  },
}

fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with_writer(io::stderr)
    .init();

  let cli = Cli::parse();

  match cli.command {
    Some(Commands::Run {
      task_file,
      execution_id,
    }) => {
      let rt = tokio::runtime::Runtime::new()?;
      rt.block_on(async { run_task(task_file, execution_id).await })?;
    }
    Some(Commands::Validate { task_file }) => {
      let def = load_task(&task_file)?;
      eprintln!("Task '{}' is valid", def.task_id);
    }
    None => {
      println!("tasklink - use --help to see available commands");
    }
  }

  Ok(())
}

fn load_task(task_file: &Path) -> Result<SendTaskDef> {
  SendTaskDef::load(task_file)
    .with_context(|| format!("failed to load task file: {}", task_file.display()))
}

async fn run_task(task_file: PathBuf, execution_id: Option<String>) -> Result<()> {
  let def = load_task(&task_file)?;
  eprintln!("Loaded task: {}", def.task_id);

  let variables = read_variables_from_stdin()?;

  let bus = MessageBus::new();
  for address in &def.bus_echo {
    bus
      .bind(address, Echo)
      .with_context(|| format!("failed to bind echo endpoint '{}'", address))?;
  }
  let services = EngineServices::new().with_message_bus(bus);

  let execution_id = execution_id.unwrap_or_else(|| Uuid::new_v4().to_string());
  let process_definition_id = def
    .process_definition_id
    .clone()
    .unwrap_or_else(|| def.task_id.clone());

  let mut execution = InMemoryExecution::new(execution_id, process_definition_id);
  for (name, value) in variables {
    execution = execution.with_variable(name, value);
  }

  let task = SendTask::new(def.task_id, def.config).context("invalid task configuration")?;
  task
    .execute(&mut execution, &EngineContext::new(&services))
    .await
    .context("send task failed")?;

  eprintln!("Task completed");

  let output: serde_json::Map<String, serde_json::Value> = execution
    .into_variables()
    .into_iter()
    .map(|(name, value)| (name, value.to_json()))
    .collect();

  println!("{}", serde_json::to_string_pretty(&output)?);

  Ok(())
}

fn read_variables_from_stdin() -> Result<Vec<(String, Value)>> {
  use std::io::IsTerminal;

  if io::stdin().is_terminal() {
    return Ok(Vec::new());
  }

  let mut input = String::new();
  io::stdin()
    .read_to_string(&mut input)
    .context("failed to read variables from stdin")?;

  if input.trim().is_empty() {
    return Ok(Vec::new());
  }

  let json: serde_json::Value =
    serde_json::from_str(&input).context("failed to parse variables JSON from stdin")?;
  match json {
    serde_json::Value::Object(map) => Ok(
      map
        .into_iter()
        .map(|(name, value)| (name, Value::from(value)))
        .collect(),
    ),
    other => anyhow::bail!("variables must be a JSON object, got {}", other),
  }
}
