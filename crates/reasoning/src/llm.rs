use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

use crate::config::{LlmConfig, LlmProvider};
use crate::retry::RetryPolicy;

/// Anything that turns a prompt into answer text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str, system_prompt: Option<&str>) -> Result<String>;
}

/// Chat completion against a local Ollama server.
#[derive(Clone)]
pub struct OllamaGenerator {
    base_url: String,
    model: String,
    temperature: f64,
    max_tokens: u32,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
    options: ChatOptions,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatOptions {
    temperature: f64,
    num_predict: u32,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: ChatResponseMessage,
    #[serde(default)]
    eval_count: Option<u64>,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

fn http_client(config: &LlmConfig) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()
        .context("Failed to build HTTP client")
}

impl OllamaGenerator {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let client = http_client(config)?;

        Ok(Self {
            base_url: config.base_url(LlmProvider::Ollama),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            client,
        })
    }
}

#[async_trait]
impl TextGenerator for OllamaGenerator {
    async fn generate(&self, prompt: &str, system_prompt: Option<&str>) -> Result<String> {
        let url = format!("{}/api/chat", self.base_url);

        let mut messages = Vec::new();
        if let Some(system) = system_prompt {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: prompt,
        });

        let request = ChatRequest {
            model: &self.model,
            messages,
            stream: false,
            options: ChatOptions {
                temperature: self.temperature,
                num_predict: self.max_tokens,
            },
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .context("Failed to send request to Ollama")?;

        if !response.status().is_success() {
            anyhow::bail!("Ollama request failed: {}", response.status());
        }

        let chat: ChatResponse = response
            .json()
            .await
            .context("Failed to parse Ollama response")?;

        info!(provider = "ollama", tokens = ?chat.eval_count, "llm generated");

        Ok(chat.message.content)
    }
}

/// Chat completions against an OpenAI-compatible endpoint.
#[derive(Clone)]
pub struct OpenAiGenerator {
    base_url: String,
    api_key: String,
    model: String,
    temperature: f64,
    max_tokens: u32,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f64,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
    #[serde(default)]
    usage: Option<OpenAiUsage>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct OpenAiUsage {
    completion_tokens: u64,
}

impl OpenAiGenerator {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        Ok(Self {
            base_url: config.base_url(LlmProvider::OpenAi),
            api_key: config.api_key(LlmProvider::OpenAi)?,
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            client: http_client(config)?,
        })
    }
}

#[async_trait]
impl TextGenerator for OpenAiGenerator {
    async fn generate(&self, prompt: &str, system_prompt: Option<&str>) -> Result<String> {
        let mut messages = Vec::new();
        if let Some(system) = system_prompt {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: prompt,
        });

        let request = OpenAiRequest {
            model: &self.model,
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .context("Failed to send request to OpenAI")?;

        if !response.status().is_success() {
            anyhow::bail!("OpenAI request failed: {}", response.status());
        }

        let completion: OpenAiResponse = response
            .json()
            .await
            .context("Failed to parse OpenAI response")?;

        let tokens = completion.usage.map(|u| u.completion_tokens);
        let choice = completion
            .choices
            .into_iter()
            .next()
            .context("OpenAI response contained no choices")?;

        info!(provider = "openai", tokens = ?tokens, "llm generated");

        Ok(choice.message.content)
    }
}

/// Messages API client; the system prompt travels as a top-level field.
#[derive(Clone)]
pub struct AnthropicGenerator {
    base_url: String,
    api_key: String,
    model: String,
    temperature: f64,
    max_tokens: u32,
    client: reqwest::Client,
}

const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicBlock>,
    #[serde(default)]
    usage: Option<AnthropicUsage>,
}

#[derive(Deserialize)]
struct AnthropicBlock {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
struct AnthropicUsage {
    output_tokens: u64,
}

impl AnthropicGenerator {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        Ok(Self {
            base_url: config.base_url(LlmProvider::Anthropic),
            api_key: config.api_key(LlmProvider::Anthropic)?,
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            client: http_client(config)?,
        })
    }
}

#[async_trait]
impl TextGenerator for AnthropicGenerator {
    async fn generate(&self, prompt: &str, system_prompt: Option<&str>) -> Result<String> {
        let request = AnthropicRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            system: system_prompt,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(format!("{}/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await
            .context("Failed to send request to Anthropic")?;

        if !response.status().is_success() {
            anyhow::bail!("Anthropic request failed: {}", response.status());
        }

        let message: AnthropicResponse = response
            .json()
            .await
            .context("Failed to parse Anthropic response")?;

        let tokens = message.usage.map(|u| u.output_tokens);
        let text = message
            .content
            .into_iter()
            .find_map(|block| block.text)
            .context("Anthropic response contained no text")?;

        info!(provider = "anthropic", tokens = ?tokens, "llm generated");

        Ok(text)
    }
}

/// Wraps another generator with exponential-backoff retries.
pub struct RetryingGenerator<G> {
    inner: G,
    policy: RetryPolicy,
}

impl<G: TextGenerator> RetryingGenerator<G> {
    pub fn new(inner: G, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait]
impl<G: TextGenerator> TextGenerator for RetryingGenerator<G> {
    async fn generate(&self, prompt: &str, system_prompt: Option<&str>) -> Result<String> {
        self.policy
            .retry("llm_generate", || self.inner.generate(prompt, system_prompt))
            .await
            .inspect_err(|e| error!(error = %e, "llm generation failed"))
    }
}

/// Pick the generator named by `llm.provider` and wrap it with retries.
pub fn build_generator(config: &LlmConfig, policy: RetryPolicy) -> Result<Arc<dyn TextGenerator>> {
    let provider = config.provider()?;

    let generator: Arc<dyn TextGenerator> = match provider {
        LlmProvider::Ollama => Arc::new(RetryingGenerator::new(OllamaGenerator::new(config)?, policy)),
        LlmProvider::OpenAi => Arc::new(RetryingGenerator::new(OpenAiGenerator::new(config)?, policy)),
        LlmProvider::Anthropic => Arc::new(RetryingGenerator::new(AnthropicGenerator::new(config)?, policy)),
    };

    info!(provider = %provider, model = %config.model, "llm generator ready");
    Ok(generator)
}
