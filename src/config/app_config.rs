use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::domain::{DomainError, EngineConfig};
use crate::infrastructure::embedding::{DEFAULT_EMBEDDING_MODEL, DEFAULT_OPENAI_BASE_URL};
use crate::infrastructure::llm::DEFAULT_OPENROUTER_BASE_URL;
use crate::infrastructure::logging::LoggingConfig;
use crate::infrastructure::observability::ObservabilityConfig;
use crate::infrastructure::web_search::{
    DEFAULT_DUCKDUCKGO_API_URL, DEFAULT_DUCKDUCKGO_HTML_URL, DEFAULT_PRIORITY_DOMAINS,
};

pub const DEFAULT_LLM_MODEL: &str = "google/gemma-3-27b-it:free";

/// Application configuration
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub observability: ObservabilityConfig,
    pub llm: LlmConfig,
    pub embedding: EmbeddingConfig,
    pub web_search: WebSearchConfig,
    pub corpus: CorpusConfig,
    pub engine: EngineConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Chat completion endpoint used for judgment and generation
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    /// Name of the environment variable holding the API key
    pub api_key_env: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub base_url: String,
    pub model: String,
    pub api_key_env: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WebSearchConfig {
    pub api_url: String,
    pub html_url: String,
    /// Hosts whose results get a relevance boost
    pub priority_domains: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CorpusConfig {
    /// Scraped passages, JSON
    pub data_path: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_OPENROUTER_BASE_URL.to_string(),
            model: DEFAULT_LLM_MODEL.to_string(),
            api_key_env: "OPENROUTER_API_KEY".to_string(),
            timeout_secs: 90,
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            model: DEFAULT_EMBEDDING_MODEL.to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            timeout_secs: 30,
        }
    }
}

impl Default for WebSearchConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_DUCKDUCKGO_API_URL.to_string(),
            html_url: DEFAULT_DUCKDUCKGO_HTML_URL.to_string(),
            priority_domains: DEFAULT_PRIORITY_DOMAINS
                .iter()
                .map(|d| d.to_string())
                .collect(),
        }
    }
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("data/br18_passages.json"),
        }
    }
}

impl LlmConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn api_key(&self) -> Result<String, DomainError> {
        read_api_key(&self.api_key_env)
    }
}

impl EmbeddingConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn api_key(&self) -> Result<String, DomainError> {
        read_api_key(&self.api_key_env)
    }
}

fn read_api_key(var: &str) -> Result<String, DomainError> {
    match std::env::var(var) {
        Ok(key) if !key.trim().is_empty() => Ok(key),
        _ => Err(DomainError::configuration(format!(
            "Environment variable {} is not set",
            var
        ))),
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        self.engine.validate()?;

        if self.llm.model.trim().is_empty() {
            return Err(DomainError::configuration("llm.model must not be empty"));
        }

        Ok(())
    }
}
