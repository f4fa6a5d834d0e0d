use serde::{Deserialize, Serialize};

use crate::error::ExtractError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    /// Capitalization and proximity rules.
    Heuristic,
    /// JSON extraction through a local language model.
    Model,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    pub strategy: StrategyKind,
    pub entity_confidence_threshold: f64,
    pub relation_confidence_threshold: f64,
    pub model: ModelExtractionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelExtractionConfig {
    pub base_url: String,
    pub model: String,
    pub max_retries: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::Heuristic,
            entity_confidence_threshold: 0.6,
            relation_confidence_threshold: 0.7,
            model: ModelExtractionConfig::default(),
        }
    }
}

impl Default for ModelExtractionConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "llama3".to_string(),
            max_retries: 3,
        }
    }
}

impl ExtractionConfig {
    pub fn validate(&self) -> Result<(), ExtractError> {
        for (name, value) in [
            ("entity_confidence_threshold", self.entity_confidence_threshold),
            ("relation_confidence_threshold", self.relation_confidence_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ExtractError::Config(format!(
                    "extraction.{} must be within [0, 1], got {}",
                    name, value
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(ExtractionConfig::default().validate().is_ok());
    }

    #[test]
    fn test_threshold_out_of_range() {
        let config = ExtractionConfig {
            relation_confidence_threshold: -0.1,
            ..Default::default()
        };

        let err = config.validate().unwrap_err();
        assert!(matches!(err, ExtractError::Config(_)));
        assert!(err.to_string().contains("relation_confidence_threshold"));
    }
}
