use anyhow::{Context, Result, bail};
use extract::ExtractionConfig;
use graph::{GraphConfig, Neo4jConfig};
use ingest::ChunkerConfig;
use reasoning::{LlmConfig, ReasoningConfig, RetryConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::context::ContextConfig;
use crate::session::SessionConfig;

pub const DEFAULT_CONFIG_PATH: &str = "configs/scholaris.toml";
pub const ENV_PREFIX: &str = "SCHOLARIS";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Default filter directive, overridden by `RUST_LOG`.
    pub level: String,
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub log: LogConfig,
    pub ingestion: ChunkerConfig,
    pub extraction: ExtractionConfig,
    pub neo4j: Neo4jConfig,
    pub graph: GraphConfig,
    pub reasoning: ReasoningConfig,
    pub llm: LlmConfig,
    pub retry: RetryConfig,
    pub session: SessionConfig,
    pub context: ContextConfig,
}

impl AppConfig {
    /// Read the TOML file (optional) and overlay `SCHOLARIS__SECTION__KEY`
    /// environment variables, then validate.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_PATH));

        let config: AppConfig = ::config::Config::builder()
            .add_source(::config::File::from(path).required(false))
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("Failed to read configuration from {}", path.display()))?
            .try_deserialize()
            .context("Invalid configuration")?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.ingestion.validate()?;
        self.graph.validate()?;
        self.extraction.validate()?;
        self.reasoning.validate()?;
        self.llm.validate()?;
        self.retry.validate()?;

        if self.context.summarization_trigger >= self.context.max_tokens {
            bail!(
                "context.summarization_trigger ({}) must be less than context.max_tokens ({})",
                self.context.summarization_trigger,
                self.context.max_tokens
            );
        }

        if self.context.history_window == 0 {
            bail!("context.history_window must be positive");
        }

        if self.session.ttl_secs == 0 {
            bail!("session.ttl_secs must be positive");
        }

        Ok(())
    }
}
