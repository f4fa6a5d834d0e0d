use std::collections::HashSet;
use tracing::debug;

use crate::schema::{Entity, EntityType};
use crate::text::{entity_id, is_entity_candidate, normalize_text};

/// Confidence given to every capitalization-based candidate.
pub const HEURISTIC_ENTITY_CONFIDENCE: f64 = 0.8;

pub struct EntityExtractor {
    confidence_threshold: f64,
}

impl EntityExtractor {
    pub fn new(confidence_threshold: f64) -> Self {
        Self {
            confidence_threshold,
        }
    }

    pub fn confidence_threshold(&self) -> f64 {
        self.confidence_threshold
    }

    pub fn extract_entities(&self, text: &str) -> Vec<Entity> {
        let candidates = self.extract_simple_patterns(text);
        let total = candidates.len();

        let filtered: Vec<Entity> = candidates
            .into_iter()
            .filter(|e| e.confidence >= self.confidence_threshold)
            .collect();

        debug!(
            total,
            filtered = filtered.len(),
            threshold = self.confidence_threshold,
            "entities extracted"
        );

        filtered
    }

    fn extract_simple_patterns(&self, text: &str) -> Vec<Entity> {
        text.split_whitespace()
            .enumerate()
            .filter(|(_, word)| is_entity_candidate(word))
            .map(|(position, word)| {
                let mut entity = Entity::new(word, EntityType::Concept)
                    .with_id(entity_id(word))
                    .with_confidence(HEURISTIC_ENTITY_CONFIDENCE);
                entity
                    .metadata
                    .insert("position".to_string(), serde_json::json!(position));
                entity
            })
            .collect()
    }

    /// Keep the first entity seen for each normalized text, in input order.
    pub fn deduplicate_entities(&self, entities: Vec<Entity>) -> Vec<Entity> {
        let original = entities.len();
        let mut seen = HashSet::new();

        let unique: Vec<Entity> = entities
            .into_iter()
            .filter(|e| seen.insert(normalize_text(&e.text)))
            .collect();

        debug!(original, unique = unique.len(), "entities deduplicated");

        unique
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(entities: &[Entity]) -> Vec<&str> {
        entities.iter().map(|e| e.text.as_str()).collect()
    }

    #[test]
    fn test_extracts_title_cased_tokens() {
        let extractor = EntityExtractor::new(0.6);
        let entities = extractor
            .extract_entities("Machine learning is a subset of Artificial Intelligence.");

        assert_eq!(texts(&entities), vec!["Machine", "Artificial", "Intelligence."]);
        assert!(entities.iter().all(|e| e.entity_type == EntityType::Concept));
        assert!(entities.iter().all(|e| e.confidence == 0.8));
        assert_eq!(entities[1].metadata["position"], serde_json::json!(6));
        assert_eq!(entities[0].id.as_deref(), Some(entity_id("machine").as_str()));
    }

    #[test]
    fn test_skips_short_and_non_title_tokens() {
        let extractor = EntityExtractor::new(0.6);
        let entities = extractor.extract_entities("The GraphRAG uses BERT and Neural-Networks");

        assert_eq!(texts(&entities), vec!["Neural-Networks"]);
    }

    #[test]
    fn test_threshold_filters_everything_above_heuristic_confidence() {
        let extractor = EntityExtractor::new(0.9);
        assert!(extractor.extract_entities("Graph Theory Rocks").is_empty());

        let exact = EntityExtractor::new(0.8);
        assert_eq!(exact.extract_entities("Graph Theory").len(), 2);
    }

    #[test]
    fn test_raising_threshold_never_adds_entities() {
        let text = "Knowledge Graphs link Papers, Authors and Methods";
        let mut previous = usize::MAX;
        for threshold in [0.0, 0.5, 0.8, 0.81, 1.0] {
            let count = EntityExtractor::new(threshold).extract_entities(text).len();
            assert!(count <= previous);
            previous = count;
        }
    }

    #[test]
    fn test_malformed_text_yields_nothing() {
        let extractor = EntityExtractor::new(0.6);
        assert!(extractor.extract_entities("").is_empty());
        assert!(extractor.extract_entities("   \n\t  ").is_empty());
        assert!(extractor.extract_entities("1234 !!!! ????").is_empty());
    }

    #[test]
    fn test_deduplicate_keeps_first_occurrence() {
        let extractor = EntityExtractor::new(0.6);
        let entities = vec![
            Entity::new("Machine Learning", EntityType::Concept).with_id("1"),
            Entity::new("Graph", EntityType::Concept).with_id("2"),
            Entity::new("machine   learning", EntityType::Method).with_id("3"),
            Entity::new("GRAPH", EntityType::Theory),
        ];

        let unique = extractor.deduplicate_entities(entities);

        assert_eq!(unique.len(), 2);
        assert_eq!(unique[0].id.as_deref(), Some("1"));
        assert_eq!(unique[1].id.as_deref(), Some("2"));
    }

    #[test]
    fn test_deduplicate_two_spellings() {
        let extractor = EntityExtractor::new(0.6);
        let unique = extractor.deduplicate_entities(vec![
            Entity::new("Machine Learning", EntityType::Concept).with_id("1"),
            Entity::new("machine learning", EntityType::Concept).with_id("2"),
        ]);

        assert_eq!(unique.len(), 1);
    }
}
