use serde::{Deserialize, Serialize};

use crate::Properties;
use crate::record::{EdgeRecord, NodeRecord, PathRecord, RelatedRecord};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    pub label: String,
    pub properties: Properties,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
    #[serde(rename = "type")]
    pub edge_type: String,
    pub properties: Properties,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphPath {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    /// Number of edges.
    pub length: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelatedEntity {
    pub node: GraphNode,
    pub relation_type: String,
}

impl GraphNode {
    pub fn text(&self) -> Option<&str> {
        self.properties.get("text").and_then(|v| v.as_str())
    }
}

impl From<NodeRecord> for GraphNode {
    fn from(record: NodeRecord) -> Self {
        Self {
            id: record.id().unwrap_or_default().to_string(),
            label: record.labels.into_iter().next().unwrap_or_default(),
            properties: record.properties,
        }
    }
}

impl From<EdgeRecord> for GraphEdge {
    fn from(record: EdgeRecord) -> Self {
        Self {
            source: record.source,
            target: record.target,
            edge_type: record.rel_type,
            properties: record.properties,
        }
    }
}

impl From<PathRecord> for GraphPath {
    fn from(record: PathRecord) -> Self {
        let edges: Vec<GraphEdge> = record.edges.into_iter().map(GraphEdge::from).collect();
        Self {
            nodes: record.nodes.into_iter().map(GraphNode::from).collect(),
            length: edges.len(),
            edges,
        }
    }
}

impl From<RelatedRecord> for RelatedEntity {
    fn from(record: RelatedRecord) -> Self {
        Self {
            node: record.node.into(),
            relation_type: record.relation_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_node_without_labels_or_id() {
        let node = GraphNode::from(NodeRecord::default());
        assert_eq!(node.id, "");
        assert_eq!(node.label, "");
    }

    #[test]
    fn test_node_takes_first_label() {
        let mut properties = Properties::new();
        properties.insert("id".to_string(), json!("abc"));
        properties.insert("text".to_string(), json!("Transformer"));

        let node = GraphNode::from(NodeRecord {
            labels: vec!["METHOD".to_string(), "CONCEPT".to_string()],
            properties,
        });

        assert_eq!(node.id, "abc");
        assert_eq!(node.label, "METHOD");
        assert_eq!(node.text(), Some("Transformer"));
    }

    #[test]
    fn test_path_length_counts_edges() {
        let record = PathRecord {
            nodes: vec![NodeRecord::default(), NodeRecord::default(), NodeRecord::default()],
            edges: vec![
                EdgeRecord {
                    rel_type: "USES".to_string(),
                    ..Default::default()
                },
                EdgeRecord {
                    rel_type: "CITES".to_string(),
                    ..Default::default()
                },
            ],
        };

        let path = GraphPath::from(record);
        assert_eq!(path.length, 2);
        assert_eq!(path.edges[1].edge_type, "CITES");
    }
}
