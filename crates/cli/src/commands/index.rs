use std::sync::Arc;

use atende_clients::{rebuild_category_index, BigQueryWarehouse, ChromaIndex, OpenAiClient};
use atende_core::config::{AppConfig, LoadOptions};

use crate::commands::{current_thread_runtime, init_logging, CommandResult};

pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "index",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };
    init_logging(&config);

    let runtime = match current_thread_runtime() {
        Ok(runtime) => runtime,
        Err(message) => return CommandResult::failure("index", "runtime_init", message, 3),
    };

    let result = runtime.block_on(async {
        let embedder = OpenAiClient::from_config(&config.llm)
            .map_err(|error| ("embedder_init", error.to_string(), 6u8))?;
        let embedder = Arc::new(embedder);
        let chroma = ChromaIndex::new(&config.index, embedder.clone());
        let warehouse = BigQueryWarehouse::from_config(&config.warehouse);

        rebuild_category_index(&warehouse, &embedder, &chroma)
            .await
            .map_err(|error| ("indexing", error.to_string(), 4u8))
    });

    match result {
        Ok(report) => CommandResult::success(
            "index",
            format!(
                "indexed {} category values in {} batches",
                report.documents, report.batches
            ),
        ),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("index", error_class, message, exit_code)
        }
    }
}
