use extract::{Entity, EntityType, Relation};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::Properties;
use crate::error::Result;
use crate::store::GraphStore;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BuildStats {
    pub nodes_written: usize,
    pub nodes_skipped: usize,
    pub relationships_written: usize,
    /// Relations whose source or target node does not exist.
    pub relationships_dropped: usize,
}

/// The only writer to the persisted graph.
pub struct GraphBuilder {
    store: Arc<dyn GraphStore>,
}

impl GraphBuilder {
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self { store }
    }

    /// Returns `false` when the entity has no ID and was skipped.
    pub async fn add_entity(&self, entity: &Entity) -> Result<bool> {
        let Some(id) = entity.id() else {
            warn!(text = %entity.text, "entity missing id, skipped");
            return Ok(false);
        };

        let mut properties = Properties::new();
        properties.insert("id".to_string(), serde_json::json!(id));
        properties.insert("text".to_string(), serde_json::json!(entity.text));
        properties.insert("confidence".to_string(), serde_json::json!(entity.confidence));
        properties.extend(entity.metadata.clone());

        self.store.create_node(entity.entity_type, properties).await?;
        debug!(id, entity_type = %entity.entity_type, "entity added");

        Ok(true)
    }

    /// Returns `false` when an endpoint was missing and nothing was written.
    pub async fn add_relation(&self, relation: &Relation) -> Result<bool> {
        let mut properties = Properties::new();
        properties.insert("confidence".to_string(), serde_json::json!(relation.confidence));
        properties.extend(relation.metadata.clone());

        let edge = self
            .store
            .create_relationship(
                &relation.source_id,
                &relation.target_id,
                relation.relation_type,
                properties,
            )
            .await?;

        debug!(
            source = %relation.source_id,
            target = %relation.target_id,
            relation_type = %relation.relation_type,
            written = edge.is_some(),
            "relation added"
        );

        Ok(edge.is_some())
    }

    /// Write every node before any edge so relations between entities of
    /// the same batch always find both endpoints.
    pub async fn build_graph(&self, entities: &[Entity], relations: &[Relation]) -> Result<BuildStats> {
        info!(
            entities = entities.len(),
            relations = relations.len(),
            backend = self.store.backend(),
            "building graph"
        );

        let mut stats = BuildStats::default();

        for entity in entities {
            if self.add_entity(entity).await? {
                stats.nodes_written += 1;
            } else {
                stats.nodes_skipped += 1;
            }
        }

        for relation in relations {
            if self.add_relation(relation).await? {
                stats.relationships_written += 1;
            } else {
                stats.relationships_dropped += 1;
            }
        }

        info!(
            nodes = stats.nodes_written,
            skipped = stats.nodes_skipped,
            relationships = stats.relationships_written,
            dropped = stats.relationships_dropped,
            "graph built"
        );

        Ok(stats)
    }

    /// Ensure an `id` index per entity label. Failures are logged and the
    /// remaining labels are still attempted. Returns how many succeeded.
    pub async fn create_indexes(&self) -> usize {
        let mut created = 0;

        for label in EntityType::ALL {
            match self.store.create_index(label).await {
                Ok(()) => {
                    info!(label = %label, "index ensured");
                    created += 1;
                }
                Err(e) => {
                    error!(label = %label, error = %e, "index creation failed");
                }
            }
        }

        created
    }
}
