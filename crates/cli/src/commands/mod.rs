pub mod ask;
pub mod chat;
pub mod config;
pub mod index;
pub mod migrate;

use std::sync::Arc;

use serde::Serialize;

use atende_agent::AgentRuntime;
use atende_clients::{BigQueryWarehouse, ChromaIndex, OpenAiClient};
use atende_core::config::{AppConfig, LogFormat};

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
        };
        Self { exit_code, output: serialize_payload(payload) }
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

pub(crate) fn init_logging(config: &AppConfig) {
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = tracing_subscriber::fmt().with_target(false).with_max_level(log_level);

    // try_init so a second command invocation in-process is a no-op
    let _ = match config.logging.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}

pub(crate) fn build_agent(config: &AppConfig) -> Result<AgentRuntime, String> {
    let llm = Arc::new(
        OpenAiClient::from_config(&config.llm)
            .map_err(|client_error| format!("llm client init failed: {client_error}"))?,
    );
    let index = Arc::new(ChromaIndex::new(&config.index, llm.clone()));
    let warehouse = Arc::new(BigQueryWarehouse::from_config(&config.warehouse));

    Ok(AgentRuntime::new(llm, index, warehouse).with_top_k(config.index.top_k))
}

pub(crate) fn current_thread_runtime() -> Result<tokio::runtime::Runtime, String> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|init_error| format!("failed to initialize async runtime: {init_error}"))
}
