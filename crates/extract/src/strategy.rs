use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::LazyLock;
use tracing::debug;

use crate::config::{ExtractionConfig, StrategyKind};
use crate::entities::EntityExtractor;
use crate::error::ExtractError;
use crate::llm::OllamaClient;
use crate::prompt::build_extraction_prompt;
use crate::relations::{RelationExtractor, filter_by_confidence};
use crate::schema::{Entity, EntityType, Extraction, Relation, RelationType};
use crate::text::entity_id;

/// Turns chunk text into entities and relations.
#[async_trait]
pub trait ExtractionStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    async fn extract(&self, text: &str) -> Result<Extraction, ExtractError>;

    /// Collapse entities sharing a normalized text, keeping the first.
    fn deduplicate(&self, entities: Vec<Entity>) -> Vec<Entity>;
}

pub fn build_strategy(config: &ExtractionConfig) -> Box<dyn ExtractionStrategy> {
    match config.strategy {
        StrategyKind::Heuristic => Box::new(HeuristicStrategy::new(config)),
        StrategyKind::Model => Box::new(ModelStrategy::new(config)),
    }
}

/// Capitalization for entities, proximity for relations.
pub struct HeuristicStrategy {
    entities: EntityExtractor,
    relations: RelationExtractor,
}

impl HeuristicStrategy {
    pub fn new(config: &ExtractionConfig) -> Self {
        Self {
            entities: EntityExtractor::new(config.entity_confidence_threshold),
            relations: RelationExtractor::new(config.relation_confidence_threshold),
        }
    }
}

#[async_trait]
impl ExtractionStrategy for HeuristicStrategy {
    fn name(&self) -> &'static str {
        "heuristic"
    }

    async fn extract(&self, text: &str) -> Result<Extraction, ExtractError> {
        let entities = self.entities.extract_entities(text);
        let relations = self.relations.extract_relations(text, &entities);

        Ok(Extraction {
            entities,
            relations,
        })
    }

    fn deduplicate(&self, entities: Vec<Entity>) -> Vec<Entity> {
        self.entities.deduplicate_entities(entities)
    }
}

/// Language-model JSON extraction, filtered by the same thresholds.
pub struct ModelStrategy {
    client: OllamaClient,
    max_retries: usize,
    entities: EntityExtractor,
    relation_threshold: f64,
}

impl ModelStrategy {
    pub fn new(config: &ExtractionConfig) -> Self {
        Self {
            client: OllamaClient::from_config(&config.model),
            max_retries: config.model.max_retries,
            entities: EntityExtractor::new(config.entity_confidence_threshold),
            relation_threshold: config.relation_confidence_threshold,
        }
    }
}

#[async_trait]
impl ExtractionStrategy for ModelStrategy {
    fn name(&self) -> &'static str {
        "model"
    }

    async fn extract(&self, text: &str) -> Result<Extraction, ExtractError> {
        let prompt = build_extraction_prompt(text);
        let raw = self
            .client
            .generate_json_with_retry(&prompt, self.max_retries)
            .await?;

        let extraction = parse_model_output(&raw)?;
        let threshold = self.entities.confidence_threshold();

        Ok(Extraction {
            entities: extraction
                .entities
                .into_iter()
                .filter(|e| e.confidence >= threshold)
                .collect(),
            relations: filter_by_confidence(extraction.relations, self.relation_threshold),
        })
    }

    fn deduplicate(&self, entities: Vec<Entity>) -> Vec<Entity> {
        self.entities.deduplicate_entities(entities)
    }
}

#[derive(Deserialize)]
struct ModelOutput {
    #[serde(default)]
    entities: Vec<ModelEntity>,
    #[serde(default)]
    relations: Vec<ModelRelation>,
}

#[derive(Deserialize)]
struct ModelEntity {
    id: String,
    text: String,
    #[serde(rename = "type", default)]
    entity_type: String,
    confidence: Option<f64>,
}

#[derive(Deserialize)]
struct ModelRelation {
    source: String,
    target: String,
    #[serde(rename = "type", default)]
    relation_type: String,
    confidence: Option<f64>,
}

static CODE_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^\s*```(?:json)?\s*(.*?)\s*```\s*$").expect("valid regex"));

/// Map model output onto the closed type sets; local `E1`-style IDs are
/// replaced by text-derived IDs and relations to unknown IDs are dropped.
pub(crate) fn parse_model_output(raw: &str) -> Result<Extraction, ExtractError> {
    let json = match CODE_FENCE.captures(raw) {
        Some(caps) => caps.get(1).map(|m| m.as_str()).unwrap_or(raw),
        None => raw,
    };

    let output: ModelOutput = serde_json::from_str(json)?;
    let mut local_ids = HashMap::new();
    let mut entities = Vec::new();

    for (position, raw_entity) in output.entities.into_iter().enumerate() {
        if raw_entity.text.trim().is_empty() {
            continue;
        }

        let id = entity_id(&raw_entity.text);
        local_ids.insert(raw_entity.id, id.clone());

        let entity_type = raw_entity
            .entity_type
            .parse()
            .unwrap_or(EntityType::Concept);
        let mut entity = Entity::new(raw_entity.text.trim(), entity_type)
            .with_id(id)
            .with_confidence(raw_entity.confidence.unwrap_or(1.0).clamp(0.0, 1.0));
        entity
            .metadata
            .insert("position".to_string(), serde_json::json!(position));
        entities.push(entity);
    }

    let relations = output
        .relations
        .into_iter()
        .filter_map(|raw_relation| {
            let source = local_ids.get(&raw_relation.source)?;
            let target = local_ids.get(&raw_relation.target)?;
            let relation_type = raw_relation
                .relation_type
                .parse()
                .unwrap_or(RelationType::Mentions);

            let mut relation = Relation::new(source.clone(), target.clone(), relation_type);
            relation.confidence = raw_relation.confidence.unwrap_or(1.0).clamp(0.0, 1.0);
            relation
                .metadata
                .insert("method".to_string(), serde_json::json!("model"));
            Some(relation)
        })
        .collect::<Vec<_>>();

    debug!(
        entities = entities.len(),
        relations = relations.len(),
        "model output parsed"
    );

    Ok(Extraction {
        entities,
        relations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_heuristic_strategy_runs_both_extractors() {
        let strategy = build_strategy(&ExtractionConfig::default());
        assert_eq!(strategy.name(), "heuristic");

        let extraction = strategy
            .extract("Vaswani introduced the Transformer architecture with Attention")
            .await
            .unwrap();

        let texts: Vec<&str> = extraction.entities.iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, vec!["Vaswani", "Transformer", "Attention"]);
        assert_eq!(extraction.relations.len(), 3);
    }

    #[test]
    fn test_parse_model_output_maps_local_ids() {
        let raw = r#"```json
{
  "entities": [
    {"id": "E1", "text": "BERT", "type": "method", "confidence": 0.9},
    {"id": "E2", "text": "Devlin", "type": "AUTHOR"},
    {"id": "E3", "text": "SQuAD", "type": "benchmark", "confidence": 0.4}
  ],
  "relations": [
    {"source": "E2", "target": "E1", "type": "AUTHORED", "confidence": 0.8},
    {"source": "E1", "target": "E9", "type": "USES"},
    {"source": "E1", "target": "E3", "type": "evaluated_on"}
  ]
}
```"#;

        let extraction = parse_model_output(raw).unwrap();

        assert_eq!(extraction.entities.len(), 3);
        assert_eq!(extraction.entities[0].entity_type, EntityType::Method);
        assert_eq!(extraction.entities[1].confidence, 1.0);
        assert_eq!(extraction.entities[2].entity_type, EntityType::Concept);

        assert_eq!(extraction.relations.len(), 2);
        assert_eq!(extraction.relations[0].relation_type, RelationType::Authored);
        assert_eq!(extraction.relations[0].source_id, entity_id("Devlin"));
        assert_eq!(extraction.relations[1].relation_type, RelationType::Mentions);
    }

    #[test]
    fn test_parse_model_output_rejects_garbage() {
        assert!(matches!(
            parse_model_output("not json at all"),
            Err(ExtractError::Parse(_))
        ));
    }
}
