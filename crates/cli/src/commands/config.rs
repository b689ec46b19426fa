use atende_core::config::{AppConfig, LoadOptions, LogFormat};

pub fn run() -> String {
    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => render(&config),
        Err(error) => format!("configuration issue: {error}"),
    }
}

fn render(config: &AppConfig) -> String {
    let format = match config.logging.format {
        LogFormat::Compact => "compact",
        LogFormat::Pretty => "pretty",
        LogFormat::Json => "json",
    };

    [
        format!("llm.base_url = {}", config.llm.base_url),
        format!("llm.api_key = {}", redact(config.llm.api_key.is_some())),
        format!("llm.model = {}", config.llm.model),
        format!("llm.embedding_model = {}", config.llm.embedding_model),
        format!("llm.timeout_secs = {}", config.llm.timeout_secs),
        format!("index.base_url = {}", config.index.base_url),
        format!("index.collection = {}", config.index.collection),
        format!("index.top_k = {}", config.index.top_k),
        format!("warehouse.project = {}", config.warehouse.project),
        format!(
            "warehouse.access_token = {}",
            redact(config.warehouse.access_token.is_some())
        ),
        format!("database.url = {}", config.database.url),
        format!("database.max_connections = {}", config.database.max_connections),
        format!("logging.level = {}", config.logging.level),
        format!("logging.format = {format}"),
    ]
    .join("\n")
}

fn redact(set: bool) -> &'static str {
    if set {
        "[redacted]"
    } else {
        "[unset]"
    }
}
