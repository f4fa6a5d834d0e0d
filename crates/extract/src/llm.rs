use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::ModelExtractionConfig;
use crate::error::ExtractError;
use crate::prompt::build_retry_prompt;

/// Ollama client used by the model-backed extraction strategy.
#[derive(Clone)]
pub struct OllamaClient {
    base_url: String,
    model: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    format: &'static str, // "json" for structured output
}

#[derive(Deserialize)]
struct OllamaResponse {
    response: String,
}

impl OllamaClient {
    pub fn new(base_url: String, model: String) -> Self {
        Self {
            base_url,
            model,
            client: reqwest::Client::new(),
        }
    }

    pub fn from_config(config: &ModelExtractionConfig) -> Self {
        Self::new(config.base_url.clone(), config.model.clone())
    }

    pub async fn generate(&self, prompt: &str) -> Result<String, ExtractError> {
        let url = format!("{}/api/generate", self.base_url);

        let request = OllamaRequest {
            model: &self.model,
            prompt,
            stream: false,
            format: "json",
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| ExtractError::Model(format!("Failed to send request to Ollama: {}", e)))?;

        if !response.status().is_success() {
            return Err(ExtractError::Model(format!(
                "Ollama request failed: {}",
                response.status()
            )));
        }

        let ollama_response: OllamaResponse = response
            .json()
            .await
            .map_err(|e| ExtractError::Model(format!("Failed to parse Ollama response: {}", e)))?;

        Ok(ollama_response.response)
    }

    /// Ask again with a correction prompt until the output parses as JSON.
    pub async fn generate_json_with_retry(
        &self,
        prompt: &str,
        max_retries: usize,
    ) -> Result<String, ExtractError> {
        let mut response = self.generate(prompt).await?;

        for attempt in 1..=max_retries {
            if serde_json::from_str::<serde_json::Value>(&response).is_ok() {
                return Ok(response);
            }

            warn!(attempt, max_retries, "model returned invalid JSON, asking for a fix");
            response = self.generate(&build_retry_prompt(&response)).await?;
        }

        serde_json::from_str::<serde_json::Value>(&response)?;
        Ok(response)
    }
}
