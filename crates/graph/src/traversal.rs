use extract::{EntityType, RelationType};
use std::sync::Arc;
use tracing::debug;

use crate::config::{GraphConfig, validate_hops};
use crate::error::Result;
use crate::store::GraphStore;
use crate::types::{GraphNode, GraphPath, RelatedEntity};

pub const DEFAULT_LIMIT: usize = 10;

/// Read-only queries over the persisted graph.
pub struct GraphTraversal {
    store: Arc<dyn GraphStore>,
    default_hops: usize,
}

impl GraphTraversal {
    pub fn new(store: Arc<dyn GraphStore>, config: &GraphConfig) -> Self {
        Self {
            store,
            default_hops: config.max_hops,
        }
    }

    /// `max_hops` of `None` or `Some(0)` uses the configured default; anything
    /// above the allowed maximum is rejected before querying.
    pub async fn find_shortest_path(
        &self,
        source_id: &str,
        target_id: &str,
        max_hops: Option<usize>,
    ) -> Result<Option<GraphPath>> {
        let hops = match max_hops {
            Some(hops) if hops > 0 => hops,
            _ => self.default_hops,
        };
        validate_hops(hops)?;

        let path = self
            .store
            .shortest_path(source_id, target_id, hops)
            .await?
            .map(GraphPath::from);

        debug!(
            source = source_id,
            target = target_id,
            hops,
            length = ?path.as_ref().map(|p| p.length),
            "shortest path"
        );

        Ok(path)
    }

    pub async fn find_related_entities(
        &self,
        entity_id: &str,
        relation_types: &[RelationType],
        limit: usize,
    ) -> Result<Vec<RelatedEntity>> {
        let related = self.store.related(entity_id, relation_types, limit).await?;
        Ok(related.into_iter().map(RelatedEntity::from).collect())
    }

    pub async fn search_entities_by_text(
        &self,
        search_text: &str,
        entity_types: &[EntityType],
        limit: usize,
    ) -> Result<Vec<GraphNode>> {
        let nodes = self.store.search_text(search_text, entity_types, limit).await?;
        Ok(nodes.into_iter().map(GraphNode::from).collect())
    }
}
