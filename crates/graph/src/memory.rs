use async_trait::async_trait;
use extract::{EntityType, RelationType};
use serde_json::Value;
use std::collections::{HashMap, HashSet, VecDeque};
use tokio::sync::RwLock;
use tracing::debug;

use crate::Properties;
use crate::config::validate_hops;
use crate::error::Result;
use crate::record::{EdgeRecord, NodeRecord, PathRecord, RelatedRecord};
use crate::store::{GraphStats, GraphStore, required_id, validate_identifier};

/// Process-local [`GraphStore`] with the same merge semantics as the Neo4j
/// backend. Used for tests and for running without a database.
#[derive(Default)]
pub struct InMemoryGraphStore {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    nodes: Vec<NodeRecord>,
    by_id: HashMap<String, usize>,
    edges: Vec<EdgeRecord>,
    indexes: HashSet<EntityType>,
}

impl InMemoryGraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn index_count(&self) -> usize {
        self.inner.read().await.indexes.len()
    }
}

impl Inner {
    fn node(&self, id: &str) -> Option<&NodeRecord> {
        self.by_id.get(id).map(|&i| &self.nodes[i])
    }

    /// Adjacency ignoring direction: node id -> (neighbour id, edge index).
    fn adjacency(&self) -> HashMap<&str, Vec<(&str, usize)>> {
        let mut adjacency: HashMap<&str, Vec<(&str, usize)>> = HashMap::new();
        for (i, edge) in self.edges.iter().enumerate() {
            adjacency
                .entry(edge.source.as_str())
                .or_default()
                .push((edge.target.as_str(), i));
            if edge.source != edge.target {
                adjacency
                    .entry(edge.target.as_str())
                    .or_default()
                    .push((edge.source.as_str(), i));
            }
        }
        adjacency
    }
}

#[async_trait]
impl GraphStore for InMemoryGraphStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn create_node(&self, label: EntityType, properties: Properties) -> Result<Option<NodeRecord>> {
        let id = required_id(&properties)?;
        let mut guard = self.inner.write().await;
        let inner = &mut *guard;
        let label = label.as_label().to_string();

        let index = match inner.by_id.get(&id).copied() {
            Some(index) => {
                let node = &mut inner.nodes[index];
                if !node.labels.contains(&label) {
                    node.labels.push(label);
                }
                node.properties.extend(properties);
                index
            }
            None => {
                inner.nodes.push(NodeRecord {
                    labels: vec![label],
                    properties,
                });
                let index = inner.nodes.len() - 1;
                inner.by_id.insert(id, index);
                index
            }
        };

        Ok(Some(inner.nodes[index].clone()))
    }

    async fn create_relationship(
        &self,
        source_id: &str,
        target_id: &str,
        rel_type: RelationType,
        properties: Properties,
    ) -> Result<Option<EdgeRecord>> {
        let mut inner = self.inner.write().await;

        if inner.node(source_id).is_none() || inner.node(target_id).is_none() {
            debug!(source = source_id, target = target_id, "relationship endpoint missing");
            return Ok(None);
        }

        let rel_type = rel_type.as_label();
        let existing = inner
            .edges
            .iter()
            .position(|e| e.source == source_id && e.target == target_id && e.rel_type == rel_type);

        let edge = match existing {
            Some(i) => {
                inner.edges[i].properties.extend(properties);
                inner.edges[i].clone()
            }
            None => {
                let edge = EdgeRecord {
                    source: source_id.to_string(),
                    target: target_id.to_string(),
                    rel_type: rel_type.to_string(),
                    properties,
                };
                inner.edges.push(edge.clone());
                edge
            }
        };

        Ok(Some(edge))
    }

    async fn find_node(
        &self,
        label: EntityType,
        property_key: &str,
        property_value: &Value,
    ) -> Result<Option<NodeRecord>> {
        validate_identifier(property_key)?;
        let inner = self.inner.read().await;
        let label = label.as_label();

        Ok(inner
            .nodes
            .iter()
            .find(|n| {
                n.labels.iter().any(|l| l == label) && n.properties.get(property_key) == Some(property_value)
            })
            .cloned())
    }

    async fn create_index(&self, label: EntityType) -> Result<()> {
        self.inner.write().await.indexes.insert(label);
        Ok(())
    }

    async fn shortest_path(
        &self,
        source_id: &str,
        target_id: &str,
        max_hops: usize,
    ) -> Result<Option<PathRecord>> {
        validate_hops(max_hops)?;
        let inner = self.inner.read().await;

        let (Some(source), Some(_)) = (inner.node(source_id), inner.node(target_id)) else {
            return Ok(None);
        };

        if source_id == target_id {
            return Ok(Some(PathRecord {
                nodes: vec![source.clone()],
                edges: Vec::new(),
            }));
        }

        let adjacency = inner.adjacency();
        // node id -> (previous node id, edge index used to reach it)
        let mut previous: HashMap<&str, (&str, usize)> = HashMap::new();
        let mut visited: HashSet<&str> = HashSet::from([source_id]);
        let mut queue: VecDeque<(&str, usize)> = VecDeque::from([(source_id, 0)]);
        let mut found = false;

        while let Some((current, depth)) = queue.pop_front() {
            if current == target_id {
                found = true;
                break;
            }
            if depth == max_hops {
                continue;
            }
            for &(neighbour, edge) in adjacency.get(current).into_iter().flatten() {
                if visited.insert(neighbour) {
                    previous.insert(neighbour, (current, edge));
                    queue.push_back((neighbour, depth + 1));
                }
            }
        }

        if !found {
            return Ok(None);
        }

        let mut node_ids = vec![target_id];
        let mut edge_indexes = Vec::new();
        let mut cursor = target_id;
        while let Some(&(prev, edge)) = previous.get(cursor) {
            edge_indexes.push(edge);
            node_ids.push(prev);
            cursor = prev;
        }
        node_ids.reverse();
        edge_indexes.reverse();

        Ok(Some(PathRecord {
            nodes: node_ids
                .iter()
                .filter_map(|id| inner.node(id).cloned())
                .collect(),
            edges: edge_indexes.iter().map(|&i| inner.edges[i].clone()).collect(),
        }))
    }

    async fn related(
        &self,
        entity_id: &str,
        relation_types: &[RelationType],
        limit: usize,
    ) -> Result<Vec<RelatedRecord>> {
        let inner = self.inner.read().await;
        let allowed: Vec<&str> = relation_types.iter().map(|t| t.as_label()).collect();

        let related = inner
            .edges
            .iter()
            .filter(|e| allowed.is_empty() || allowed.contains(&e.rel_type.as_str()))
            .filter_map(|e| {
                let other = if e.source == entity_id {
                    &e.target
                } else if e.target == entity_id {
                    &e.source
                } else {
                    return None;
                };
                inner.node(other).map(|node| RelatedRecord {
                    node: node.clone(),
                    relation_type: e.rel_type.clone(),
                })
            })
            .take(limit)
            .collect();

        Ok(related)
    }

    async fn search_text(
        &self,
        search_text: &str,
        entity_types: &[EntityType],
        limit: usize,
    ) -> Result<Vec<NodeRecord>> {
        let inner = self.inner.read().await;
        let needle = search_text.to_lowercase();
        let labels: Vec<&str> = entity_types.iter().map(|t| t.as_label()).collect();

        Ok(inner
            .nodes
            .iter()
            .filter(|n| labels.is_empty() || n.labels.iter().any(|l| labels.contains(&l.as_str())))
            .filter(|n| {
                n.text()
                    .map(|text| text.to_lowercase().contains(&needle))
                    .unwrap_or(false)
            })
            .take(limit)
            .cloned()
            .collect())
    }

    async fn stats(&self) -> Result<GraphStats> {
        let inner = self.inner.read().await;
        Ok(GraphStats {
            node_count: inner.nodes.len(),
            relationship_count: inner.edges.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GraphError;
    use serde_json::json;

    fn props(id: &str, text: &str) -> Properties {
        let mut properties = Properties::new();
        properties.insert("id".to_string(), json!(id));
        properties.insert("text".to_string(), json!(text));
        properties
    }

    async fn chain(store: &InMemoryGraphStore, ids: &[&str]) {
        for id in ids {
            store
                .create_node(EntityType::Concept, props(id, &format!("Node {}", id)))
                .await
                .unwrap();
        }
        for pair in ids.windows(2) {
            store
                .create_relationship(pair[0], pair[1], RelationType::Mentions, Properties::new())
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_create_node_merges_on_id() {
        let store = InMemoryGraphStore::new();
        store.create_node(EntityType::Concept, props("a", "Alpha")).await.unwrap();
        let merged = store
            .create_node(EntityType::Concept, props("a", "Alpha Prime"))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(merged.text(), Some("Alpha Prime"));
        assert_eq!(store.stats().await.unwrap().node_count, 1);
    }

    #[tokio::test]
    async fn test_create_node_requires_id() {
        let store = InMemoryGraphStore::new();
        let result = store.create_node(EntityType::Concept, Properties::new()).await;
        assert!(matches!(result, Err(GraphError::Validation(_))));
    }

    #[tokio::test]
    async fn test_relationship_with_missing_endpoint_is_a_no_op() {
        let store = InMemoryGraphStore::new();
        store.create_node(EntityType::Concept, props("a", "Alpha")).await.unwrap();

        let edge = store
            .create_relationship("a", "ghost", RelationType::Uses, Properties::new())
            .await
            .unwrap();

        assert!(edge.is_none());
        assert_eq!(store.stats().await.unwrap().relationship_count, 0);
    }

    #[tokio::test]
    async fn test_relationship_merges_on_endpoints_and_type() {
        let store = InMemoryGraphStore::new();
        chain(&store, &["a", "b"]).await;
        store
            .create_relationship("a", "b", RelationType::Mentions, Properties::new())
            .await
            .unwrap();
        store
            .create_relationship("a", "b", RelationType::Uses, Properties::new())
            .await
            .unwrap();

        assert_eq!(store.stats().await.unwrap().relationship_count, 2);
    }

    #[tokio::test]
    async fn test_find_node_by_property() {
        let store = InMemoryGraphStore::new();
        store.create_node(EntityType::Author, props("v", "Vaswani")).await.unwrap();

        let found = store
            .find_node(EntityType::Author, "text", &json!("Vaswani"))
            .await
            .unwrap();
        assert_eq!(found.unwrap().id(), Some("v"));

        let wrong_label = store
            .find_node(EntityType::Paper, "text", &json!("Vaswani"))
            .await
            .unwrap();
        assert!(wrong_label.is_none());

        assert!(store.find_node(EntityType::Author, "te xt", &json!("x")).await.is_err());
    }

    #[tokio::test]
    async fn test_shortest_path_is_undirected_and_bounded() {
        let store = InMemoryGraphStore::new();
        chain(&store, &["a", "b", "c", "d"]).await;

        let path = store.shortest_path("d", "a", 3).await.unwrap().unwrap();
        let ids: Vec<&str> = path.nodes.iter().filter_map(|n| n.id()).collect();
        assert_eq!(ids, vec!["d", "c", "b", "a"]);
        assert_eq!(path.edges.len(), 3);

        assert!(store.shortest_path("a", "d", 2).await.unwrap().is_none());
        assert!(store.shortest_path("a", "missing", 3).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_shortest_path_prefers_fewer_hops() {
        let store = InMemoryGraphStore::new();
        chain(&store, &["a", "b", "c", "d"]).await;
        store
            .create_relationship("a", "d", RelationType::Cites, Properties::new())
            .await
            .unwrap();

        let path = store.shortest_path("a", "d", 3).await.unwrap().unwrap();
        assert_eq!(path.edges.len(), 1);
        assert_eq!(path.edges[0].rel_type, "CITES");
    }

    #[tokio::test]
    async fn test_related_filters_by_type_and_limit() {
        let store = InMemoryGraphStore::new();
        chain(&store, &["a", "b", "c"]).await;
        store
            .create_relationship("c", "a", RelationType::Cites, Properties::new())
            .await
            .unwrap();

        let all = store.related("a", &[], 10).await.unwrap();
        assert_eq!(all.len(), 2);

        let cites = store.related("a", &[RelationType::Cites], 10).await.unwrap();
        assert_eq!(cites.len(), 1);
        assert_eq!(cites[0].node.id(), Some("c"));

        assert_eq!(store.related("a", &[], 1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_search_text_is_case_insensitive() {
        let store = InMemoryGraphStore::new();
        store
            .create_node(EntityType::Method, props("t", "Transformer"))
            .await
            .unwrap();
        store
            .create_node(EntityType::Concept, props("a", "Attention"))
            .await
            .unwrap();

        let hits = store.search_text("TRANS", &[], 10).await.unwrap();
        assert_eq!(hits.len(), 1);

        let restricted = store
            .search_text("t", &[EntityType::Concept], 10)
            .await
            .unwrap();
        assert_eq!(restricted.len(), 1);
        assert_eq!(restricted[0].id(), Some("a"));
    }
}
