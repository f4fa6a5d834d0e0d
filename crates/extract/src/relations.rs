use tracing::debug;

use crate::schema::{Entity, Relation, RelationType};

/// Confidence given to every proximity-based relation.
pub const PROXIMITY_RELATION_CONFIDENCE: f64 = 0.7;

/// How many following entities each entity is paired with.
const PROXIMITY_WINDOW: usize = 2;

pub struct RelationExtractor {
    confidence_threshold: f64,
}

impl RelationExtractor {
    pub fn new(confidence_threshold: f64) -> Self {
        Self {
            confidence_threshold,
        }
    }

    pub fn extract_relations(&self, text: &str, entities: &[Entity]) -> Vec<Relation> {
        let relations = self.extract_proximity_relations(text, entities);
        let total = relations.len();

        let filtered: Vec<Relation> = relations
            .into_iter()
            .filter(|r| r.confidence >= self.confidence_threshold)
            .collect();

        debug!(
            total,
            filtered = filtered.len(),
            threshold = self.confidence_threshold,
            "relations extracted"
        );

        filtered
    }

    /// Pair every entity with its next two neighbours in extraction order.
    fn extract_proximity_relations(&self, _text: &str, entities: &[Entity]) -> Vec<Relation> {
        let mut relations = Vec::new();

        for (i, source) in entities.iter().enumerate() {
            let window_end = (i + 1 + PROXIMITY_WINDOW).min(entities.len());

            for target in &entities[i + 1..window_end] {
                if let (Some(source_id), Some(target_id)) = (source.id(), target.id()) {
                    let mut relation = Relation::new(source_id, target_id, RelationType::Mentions);
                    relation.confidence = PROXIMITY_RELATION_CONFIDENCE;
                    relation
                        .metadata
                        .insert("method".to_string(), serde_json::json!("proximity"));
                    relations.push(relation);
                }
            }
        }

        relations
    }

    pub fn filter_by_confidence(&self, relations: Vec<Relation>, min_confidence: f64) -> Vec<Relation> {
        filter_by_confidence(relations, min_confidence)
    }
}

/// Keep relations whose confidence is at least `min_confidence`.
pub fn filter_by_confidence(relations: Vec<Relation>, min_confidence: f64) -> Vec<Relation> {
    let original = relations.len();
    let filtered: Vec<Relation> = relations
        .into_iter()
        .filter(|r| r.confidence >= min_confidence)
        .collect();

    debug!(
        original,
        filtered = filtered.len(),
        threshold = min_confidence,
        "relations filtered"
    );

    filtered
}
