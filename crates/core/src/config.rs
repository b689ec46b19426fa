use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::SecretString;
use serde::Deserialize;
use thiserror::Error;

/// Effective application configuration: defaults, then the optional TOML
/// file, then `ATENDE_*` environment variables, then programmatic
/// overrides, then validation.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub llm: LlmConfig,
    pub index: IndexConfig,
    pub warehouse: WarehouseConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct LlmConfig {
    /// OpenAI-compatible API root, e.g. `https://api.openai.com/v1`.
    pub base_url: String,
    pub api_key: Option<SecretString>,
    pub model: String,
    pub embedding_model: String,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct IndexConfig {
    /// Vector index (Chroma) API root.
    pub base_url: String,
    pub collection: String,
    pub top_k: usize,
}

#[derive(Clone, Debug)]
pub struct WarehouseConfig {
    /// Billing project the warehouse jobs run under.
    pub project: String,
    pub access_token: Option<SecretString>,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    /// Conversation checkpoint store.
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub llm_model: Option<String>,
    pub index_collection: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            llm: LlmConfig {
                base_url: "https://api.openai.com/v1".to_string(),
                api_key: None,
                model: "gpt-4o-mini".to_string(),
                embedding_model: "text-embedding-3-small".to_string(),
                timeout_secs: 60,
            },
            index: IndexConfig {
                base_url: "http://localhost:8000".to_string(),
                collection: "categories_1746".to_string(),
                top_k: 5,
            },
            warehouse: WarehouseConfig { project: String::new(), access_token: None },
            database: DatabaseConfig {
                url: "sqlite://atende.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    llm: Option<LlmPatch>,
    index: Option<IndexPatch>,
    warehouse: Option<WarehousePatch>,
    database: Option<DatabasePatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Deserialize)]
struct LlmPatch {
    base_url: Option<String>,
    api_key: Option<String>,
    model: Option<String>,
    embedding_model: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct IndexPatch {
    base_url: Option<String>,
    collection: Option<String>,
    top_k: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct WarehousePatch {
    project: Option<String>,
    access_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        match resolve_config_path(options.config_path.as_deref()) {
            Some(path) => {
                let patch = read_patch(&path)?;
                config.apply_patch(patch);
            }
            None if options.require_file => {
                let expected =
                    options.config_path.unwrap_or_else(|| PathBuf::from("atende.toml"));
                return Err(ConfigError::MissingConfigFile(expected));
            }
            None => {}
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(llm) = patch.llm {
            if let Some(base_url) = llm.base_url {
                self.llm.base_url = base_url;
            }
            if let Some(api_key) = llm.api_key {
                self.llm.api_key = Some(api_key.into());
            }
            if let Some(model) = llm.model {
                self.llm.model = model;
            }
            if let Some(embedding_model) = llm.embedding_model {
                self.llm.embedding_model = embedding_model;
            }
            if let Some(timeout_secs) = llm.timeout_secs {
                self.llm.timeout_secs = timeout_secs;
            }
        }

        if let Some(index) = patch.index {
            if let Some(base_url) = index.base_url {
                self.index.base_url = base_url;
            }
            if let Some(collection) = index.collection {
                self.index.collection = collection;
            }
            if let Some(top_k) = index.top_k {
                self.index.top_k = top_k;
            }
        }

        if let Some(warehouse) = patch.warehouse {
            if let Some(project) = warehouse.project {
                self.warehouse.project = project;
            }
            if let Some(access_token) = warehouse.access_token {
                self.warehouse.access_token = Some(access_token.into());
            }
        }

        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("ATENDE_LLM_BASE_URL") {
            self.llm.base_url = value;
        }
        if let Some(value) = read_env("ATENDE_LLM_API_KEY") {
            self.llm.api_key = Some(value.into());
        }
        if let Some(value) = read_env("ATENDE_LLM_MODEL") {
            self.llm.model = value;
        }
        if let Some(value) = read_env("ATENDE_LLM_EMBEDDING_MODEL") {
            self.llm.embedding_model = value;
        }
        if let Some(value) = read_env("ATENDE_LLM_TIMEOUT_SECS") {
            self.llm.timeout_secs = parse_u64("ATENDE_LLM_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("ATENDE_INDEX_BASE_URL") {
            self.index.base_url = value;
        }
        if let Some(value) = read_env("ATENDE_INDEX_COLLECTION") {
            self.index.collection = value;
        }
        if let Some(value) = read_env("ATENDE_INDEX_TOP_K") {
            self.index.top_k = parse_usize("ATENDE_INDEX_TOP_K", &value)?;
        }

        if let Some(value) = read_env("ATENDE_WAREHOUSE_PROJECT") {
            self.warehouse.project = value;
        }
        if let Some(value) = read_env("ATENDE_WAREHOUSE_ACCESS_TOKEN") {
            self.warehouse.access_token = Some(value.into());
        }

        if let Some(value) = read_env("ATENDE_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("ATENDE_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections =
                parse_u32("ATENDE_DATABASE_MAX_CONNECTIONS", &value)?;
        }

        if let Some(value) = read_env("ATENDE_LOG_LEVEL") {
            self.logging.level = value;
        }
        if let Some(value) = read_env("ATENDE_LOG_FORMAT") {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(database_url) = overrides.database_url {
            self.database.url = database_url;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(llm_model) = overrides.llm_model {
            self.llm.model = llm_model;
        }
        if let Some(index_collection) = overrides.index_collection {
            self.index.collection = index_collection;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.database.url.is_empty() {
            return Err(ConfigError::Validation("database.url must not be empty".to_string()));
        }
        if self.index.top_k == 0 {
            return Err(ConfigError::Validation("index.top_k must be at least 1".to_string()));
        }
        if self.index.collection.is_empty() {
            return Err(ConfigError::Validation(
                "index.collection must not be empty".to_string(),
            ));
        }
        if self.llm.model.is_empty() || self.llm.embedding_model.is_empty() {
            return Err(ConfigError::Validation(
                "llm.model and llm.embedding_model must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    match explicit {
        Some(path) if path.exists() => Some(path.to_path_buf()),
        Some(_) => None,
        None => {
            let default = PathBuf::from("atende.toml");
            default.exists().then_some(default)
        }
    }
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;
    toml::from_str(&raw)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_usize(key: &str, value: &str) -> Result<usize, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::{AppConfig, ConfigOverrides, LoadOptions, LogFormat};

    #[test]
    fn defaults_pass_validation() {
        let config = AppConfig::load(LoadOptions::default()).expect("defaults load");
        assert_eq!(config.index.top_k, 5);
        assert_eq!(config.index.collection, "categories_1746");
        assert_eq!(config.logging.format, LogFormat::Compact);
    }

    #[test]
    fn toml_file_patches_defaults() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(
            file,
            r#"
[llm]
model = "gpt-4.1"

[index]
top_k = 8

[logging]
level = "debug"
format = "json"
"#
        )
        .expect("write config");

        let config = AppConfig::load(LoadOptions {
            config_path: Some(file.path().to_path_buf()),
            require_file: true,
            overrides: ConfigOverrides::default(),
        })
        .expect("config loads");

        assert_eq!(config.llm.model, "gpt-4.1");
        assert_eq!(config.index.top_k, 8);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Json);
        // untouched sections keep their defaults
        assert_eq!(config.database.max_connections, 5);
    }

    #[test]
    fn missing_required_file_is_an_error() {
        let result = AppConfig::load(LoadOptions {
            config_path: Some("does-not-exist.toml".into()),
            require_file: true,
            overrides: ConfigOverrides::default(),
        });
        assert!(result.is_err());
    }

    #[test]
    fn programmatic_overrides_win_over_file_values() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, "[database]\nurl = \"sqlite://from-file.db\"\n").expect("write config");

        let config = AppConfig::load(LoadOptions {
            config_path: Some(file.path().to_path_buf()),
            require_file: true,
            overrides: ConfigOverrides {
                database_url: Some("sqlite://from-override.db".to_string()),
                ..ConfigOverrides::default()
            },
        })
        .expect("config loads");

        assert_eq!(config.database.url, "sqlite://from-override.db");
    }

    #[test]
    fn zero_top_k_fails_validation() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, "[index]\ntop_k = 0\n").expect("write config");

        let result = AppConfig::load(LoadOptions {
            config_path: Some(file.path().to_path_buf()),
            require_file: true,
            overrides: ConfigOverrides::default(),
        });
        assert!(result.is_err());
    }
}
