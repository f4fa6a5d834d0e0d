use serde::{Deserialize, Serialize};

use crate::error::{GraphError, Result};

pub const MIN_HOPS: usize = 1;
pub const MAX_HOPS: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Neo4jConfig {
    pub uri: String,
    pub user: String,
    pub password: String,
    pub database: String,
    pub max_connection_pool_size: usize,
    pub fetch_size: usize,
}

impl Default for Neo4jConfig {
    fn default() -> Self {
        Self {
            uri: "bolt://localhost:7687".to_string(),
            user: "neo4j".to_string(),
            password: "password".to_string(),
            database: "scholaris".to_string(),
            max_connection_pool_size: 50,
            fetch_size: 200,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GraphBackend {
    Neo4j,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    pub backend: GraphBackend,
    /// Default bound for shortest-path searches.
    pub max_hops: usize,
    /// Mean step confidence a reasoning trace needs to count as consistent.
    pub min_confidence: f64,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            backend: GraphBackend::Neo4j,
            max_hops: 3,
            min_confidence: 0.7,
        }
    }
}

impl GraphConfig {
    pub fn validate(&self) -> Result<()> {
        validate_hops(self.max_hops)?;

        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(GraphError::Validation(format!(
                "graph.min_confidence must be within [0, 1], got {}",
                self.min_confidence
            )));
        }

        Ok(())
    }
}

pub fn validate_hops(hops: usize) -> Result<()> {
    if !(MIN_HOPS..=MAX_HOPS).contains(&hops) {
        return Err(GraphError::Validation(format!(
            "max_hops must be between {} and {}, got {}",
            MIN_HOPS, MAX_HOPS, hops
        )));
    }
    Ok(())
}
