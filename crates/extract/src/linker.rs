use std::collections::HashMap;
use tracing::{debug, info};

use crate::schema::Entity;
use crate::text::normalize_text;

/// Maps entity mentions to the first entity seen under the same normalized
/// text. The index only grows; create one linker per ingestion run.
#[derive(Debug, Default)]
pub struct EntityLinker {
    entity_index: HashMap<String, Entity>,
}

impl EntityLinker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the canonical ID for `entity`, or an empty string when neither
    /// the canonical entity nor `entity` carries an ID.
    pub fn link_entity(&mut self, entity: &Entity) -> String {
        let normalized = normalize_text(&entity.text);

        if let Some(canonical) = self.entity_index.get(&normalized) {
            debug!(text = %entity.text, canonical_id = ?canonical.id, "entity linked");
            // A canonical entry without an ID defers to the incoming one
            // without updating the index.
            return canonical
                .id()
                .or(entity.id())
                .unwrap_or_default()
                .to_string();
        }

        match entity.id() {
            Some(id) => {
                let id = id.to_string();
                self.entity_index.insert(normalized, entity.clone());
                id
            }
            None => String::new(),
        }
    }

    /// `original_id -> canonical_id` for every entity carrying an ID.
    pub fn link_entities(&mut self, entities: &[Entity]) -> HashMap<String, String> {
        let mut mapping = HashMap::new();

        for entity in entities {
            if let Some(id) = entity.id() {
                let canonical_id = self.link_entity(entity);
                mapping.insert(id.to_string(), canonical_id);
            }
        }

        info!(
            total = entities.len(),
            unique = self.entity_index.len(),
            "entities linked"
        );

        mapping
    }

    pub fn get_canonical_entity(&self, text: &str) -> Option<&Entity> {
        self.entity_index.get(&normalize_text(text))
    }

    pub fn len(&self) -> usize {
        self.entity_index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entity_index.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::EntityType;

    #[test]
    fn test_variants_share_canonical_id() {
        let mut linker = EntityLinker::new();

        let id1 = linker.link_entity(&Entity::new("Machine Learning", EntityType::Concept).with_id("1"));
        let id2 = linker.link_entity(&Entity::new("machine learning", EntityType::Concept).with_id("2"));

        assert_eq!(id1, "1");
        assert_eq!(id1, id2);
        assert_eq!(linker.len(), 1);
    }

    #[test]
    fn test_entity_without_id_is_not_registered() {
        let mut linker = EntityLinker::new();

        let id = linker.link_entity(&Entity::new("Graph Theory", EntityType::Theory));

        assert_eq!(id, "");
        assert!(linker.is_empty());
        assert!(linker.get_canonical_entity("graph theory").is_none());
    }

    #[test]
    fn test_later_mentions_resolve_to_first() {
        let mut linker = EntityLinker::new();
        linker.link_entity(&Entity::new("Transformer", EntityType::Method).with_id("t1"));

        let id = linker.link_entity(&Entity::new("TRANSFORMER", EntityType::Paper));
        assert_eq!(id, "t1");

        let canonical = linker.get_canonical_entity("  transformer ").unwrap();
        assert_eq!(canonical.entity_type, EntityType::Method);
    }

    #[test]
    fn test_link_entities_skips_entities_without_ids() {
        let mut linker = EntityLinker::new();
        let entities = vec![
            Entity::new("Graph", EntityType::Concept).with_id("a"),
            Entity::new("graph", EntityType::Concept).with_id("b"),
            Entity::new("Node", EntityType::Concept),
            Entity::new("Edge", EntityType::Concept).with_id("c"),
        ];

        let mapping = linker.link_entities(&entities);

        assert_eq!(mapping.len(), 3);
        assert_eq!(mapping["a"], "a");
        assert_eq!(mapping["b"], "a");
        assert_eq!(mapping["c"], "c");
    }

    #[test]
    fn test_new_linker_starts_empty() {
        let mut first = EntityLinker::new();
        first.link_entity(&Entity::new("Graph", EntityType::Concept).with_id("a"));

        let mut second = EntityLinker::new();
        let id = second.link_entity(&Entity::new("Graph", EntityType::Concept).with_id("z"));
        assert_eq!(id, "z");
    }
}
