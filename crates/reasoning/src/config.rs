use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::{ReasoningError, Result};

/// Answer-generation backends selectable through `llm.provider`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum LlmProvider {
    Ollama,
    OpenAi,
    Anthropic,
}

impl LlmProvider {
    pub const ALL: [LlmProvider; 3] = [LlmProvider::Ollama, LlmProvider::OpenAi, LlmProvider::Anthropic];

    pub fn default_base_url(&self) -> &'static str {
        match self {
            LlmProvider::Ollama => "http://localhost:11434",
            LlmProvider::OpenAi => "https://api.openai.com/v1",
            LlmProvider::Anthropic => "https://api.anthropic.com/v1",
        }
    }

    /// Environment variable consulted when `llm.api_key` is unset.
    pub fn api_key_env(&self) -> Option<&'static str> {
        match self {
            LlmProvider::Ollama => None,
            LlmProvider::OpenAi => Some("OPENAI_API_KEY"),
            LlmProvider::Anthropic => Some("ANTHROPIC_API_KEY"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReasoningConfig {
    /// Upper bound on recorded reasoning steps per query.
    pub max_steps: usize,
    pub verify_consistency: bool,
}

impl Default for ReasoningConfig {
    fn default() -> Self {
        Self {
            max_steps: 5,
            verify_consistency: true,
        }
    }
}

impl ReasoningConfig {
    pub fn validate(&self) -> Result<()> {
        if !(1..=20).contains(&self.max_steps) {
            return Err(ReasoningError::Config(format!(
                "reasoning.max_steps must be between 1 and 20, got {}",
                self.max_steps
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// One of `ollama`, `openai`, `anthropic`.
    pub provider: String,
    /// Provider default when unset.
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            base_url: None,
            api_key: None,
            model: "llama3".to_string(),
            temperature: 0.1,
            max_tokens: 4096,
            timeout_secs: 60,
        }
    }
}

impl LlmConfig {
    pub fn provider(&self) -> Result<LlmProvider> {
        self.provider.parse().map_err(|_| {
            ReasoningError::Config(format!(
                "Unsupported LLM provider: {}. Must be one of {:?}",
                self.provider,
                LlmProvider::ALL.map(|p| p.to_string())
            ))
        })
    }

    pub fn base_url(&self, provider: LlmProvider) -> String {
        self.base_url
            .as_deref()
            .unwrap_or(provider.default_base_url())
            .trim_end_matches('/')
            .to_string()
    }

    /// Configured key, else the provider's environment variable.
    pub fn api_key(&self, provider: LlmProvider) -> Result<String> {
        if let Some(key) = self.api_key.as_ref().filter(|k| !k.is_empty()) {
            return Ok(key.clone());
        }

        let Some(var) = provider.api_key_env() else {
            return Ok(String::new());
        };

        std::env::var(var)
            .ok()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| ReasoningError::Config(format!("{} API key not configured (llm.api_key or {})", provider, var)))
    }

    pub fn validate(&self) -> Result<()> {
        self.provider()?;

        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ReasoningError::Config(format!(
                "llm.temperature must be within [0, 2], got {}",
                self.temperature
            )));
        }

        if self.max_tokens == 0 || self.timeout_secs == 0 {
            return Err(ReasoningError::Config(
                "llm.max_tokens and llm.timeout_secs must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts, including the first one.
    pub max_attempts: usize,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 1000,
            max_backoff_ms: 4000,
        }
    }
}

impl RetryConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(ReasoningError::Config(
                "retry.max_attempts must be positive".to_string(),
            ));
        }
        if self.initial_backoff_ms > self.max_backoff_ms {
            return Err(ReasoningError::Config(format!(
                "retry.initial_backoff_ms ({}) exceeds retry.max_backoff_ms ({})",
                self.initial_backoff_ms, self.max_backoff_ms
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(ReasoningConfig::default().validate().is_ok());
        assert!(LlmConfig::default().validate().is_ok());
        assert!(RetryConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_out_of_range_values() {
        let steps = ReasoningConfig {
            max_steps: 21,
            ..Default::default()
        };
        assert!(matches!(steps.validate(), Err(ReasoningError::Config(_))));

        let provider = LlmConfig {
            provider: "carrier-pigeon".to_string(),
            ..Default::default()
        };
        let err = provider.validate().unwrap_err();
        assert!(err.to_string().contains("carrier-pigeon"));

        let retry = RetryConfig {
            initial_backoff_ms: 5000,
            ..Default::default()
        };
        assert!(retry.validate().is_err());
    }

    #[test]
    fn test_provider_names() {
        for (name, expected) in [
            ("ollama", LlmProvider::Ollama),
            ("openai", LlmProvider::OpenAi),
            ("anthropic", LlmProvider::Anthropic),
        ] {
            let config = LlmConfig {
                provider: name.to_string(),
                ..Default::default()
            };
            assert!(config.validate().is_ok());
            assert_eq!(config.provider().unwrap(), expected);
            assert_eq!(expected.to_string(), name);
        }
    }

    #[test]
    fn test_base_url_defaults_per_provider() {
        let config = LlmConfig::default();
        assert_eq!(config.base_url(LlmProvider::Anthropic), "https://api.anthropic.com/v1");

        let custom = LlmConfig {
            base_url: Some("http://proxy:8080/".to_string()),
            ..Default::default()
        };
        assert_eq!(custom.base_url(LlmProvider::OpenAi), "http://proxy:8080");
    }

    #[test]
    fn test_explicit_api_key_wins() {
        let config = LlmConfig {
            api_key: Some("sk-test".to_string()),
            ..Default::default()
        };
        assert_eq!(config.api_key(LlmProvider::OpenAi).unwrap(), "sk-test");
        assert_eq!(LlmConfig::default().api_key(LlmProvider::Ollama).unwrap(), "");
    }
}
