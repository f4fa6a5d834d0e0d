use async_trait::async_trait;
use extract::{EntityType, RelationType};
use serde::{Deserialize, Serialize};

use crate::Properties;
use crate::error::{GraphError, Result};
use crate::record::{EdgeRecord, NodeRecord, PathRecord, RelatedRecord};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStats {
    pub node_count: usize,
    pub relationship_count: usize,
}

/// Persistence boundary for the knowledge graph.
///
/// Labels and relationship types only ever come from the closed
/// [`EntityType`] / [`RelationType`] sets. Writes merge: a node is keyed by
/// its `id` property, an edge by its endpoints and type.
#[async_trait]
pub trait GraphStore: Send + Sync {
    fn backend(&self) -> &'static str;

    /// Merge a node; `properties` must carry a string `id`.
    async fn create_node(&self, label: EntityType, properties: Properties) -> Result<Option<NodeRecord>>;

    /// Merge an edge between two existing nodes. Returns `None` when either
    /// endpoint is missing.
    async fn create_relationship(
        &self,
        source_id: &str,
        target_id: &str,
        rel_type: RelationType,
        properties: Properties,
    ) -> Result<Option<EdgeRecord>>;

    async fn find_node(
        &self,
        label: EntityType,
        property_key: &str,
        property_value: &serde_json::Value,
    ) -> Result<Option<NodeRecord>>;

    /// Create the `id` index for `label` if it does not exist yet.
    async fn create_index(&self, label: EntityType) -> Result<()>;

    /// Shortest undirected path of at most `max_hops` edges.
    async fn shortest_path(
        &self,
        source_id: &str,
        target_id: &str,
        max_hops: usize,
    ) -> Result<Option<PathRecord>>;

    /// One-hop neighbours in either direction. An empty `relation_types`
    /// accepts every type.
    async fn related(
        &self,
        entity_id: &str,
        relation_types: &[RelationType],
        limit: usize,
    ) -> Result<Vec<RelatedRecord>>;

    /// Case-insensitive substring match on the `text` property. An empty
    /// `entity_types` accepts every label.
    async fn search_text(
        &self,
        search_text: &str,
        entity_types: &[EntityType],
        limit: usize,
    ) -> Result<Vec<NodeRecord>>;

    async fn stats(&self) -> Result<GraphStats>;
}

/// Property keys end up inside query text, so only plain identifiers pass.
pub fn validate_identifier(key: &str) -> Result<()> {
    let mut chars = key.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };

    if !valid {
        return Err(GraphError::Validation(format!(
            "Invalid property key: {:?}",
            key
        )));
    }
    Ok(())
}

pub(crate) fn required_id(properties: &Properties) -> Result<String> {
    properties
        .get("id")
        .and_then(|v| v.as_str())
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .ok_or_else(|| GraphError::Validation("Node properties must include a string id".to_string()))
}
