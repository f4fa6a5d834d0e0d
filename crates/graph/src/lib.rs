pub mod builder;
pub mod config;
pub mod error;
pub mod memory;
pub mod neo4j_client;
pub mod record;
pub mod store;
pub mod traversal;
pub mod types;

pub use builder::{BuildStats, GraphBuilder};
pub use config::{GraphBackend, GraphConfig, Neo4jConfig};
pub use error::{GraphError, Result};
pub use memory::InMemoryGraphStore;
pub use neo4j_client::Neo4jClient;
pub use record::{EdgeRecord, NodeRecord, PathRecord, RelatedRecord};
pub use store::{GraphStats, GraphStore};
pub use traversal::GraphTraversal;
pub use types::{GraphEdge, GraphNode, GraphPath, RelatedEntity};

use std::collections::HashMap;
use std::sync::Arc;

/// Node and edge property map.
pub type Properties = HashMap<String, serde_json::Value>;

/// Open the configured backend.
pub async fn connect(neo4j: &Neo4jConfig, graph: &GraphConfig) -> Result<Arc<dyn GraphStore>> {
    match graph.backend {
        GraphBackend::Neo4j => Ok(Arc::new(Neo4jClient::connect(neo4j).await?)),
        GraphBackend::Memory => Ok(Arc::new(InMemoryGraphStore::new())),
    }
}
