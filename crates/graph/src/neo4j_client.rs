use async_trait::async_trait;
use extract::{EntityType, RelationType};
use neo4rs::{
    BoltBoolean, BoltFloat, BoltInteger, BoltList, BoltMap, BoltNull, BoltString, BoltType,
    ConfigBuilder, Graph, Query, Row,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error, info};

use crate::Properties;
use crate::config::Neo4jConfig;
use crate::error::{GraphError, Result};
use crate::record::{EdgeRecord, NodeRecord, PathRecord, RelatedRecord};
use crate::store::{GraphStats, GraphStore, required_id, validate_identifier};

const LOGGED_QUERY_CHARS: usize = 100;
const ERROR_MESSAGE_CHARS: usize = 200;

const NODE_PROJECTION: &str = "labels(n) AS labels, properties(n) AS properties";
const EDGE_PROJECTION: &str = "coalesce(startNode(r).id, '') AS source, \
     coalesce(endNode(r).id, '') AS target, type(r) AS type, properties(r) AS properties";

/// Neo4j-backed [`GraphStore`]. Cheap to clone; the driver pools
/// connections and every query borrows one for its own duration.
#[derive(Clone)]
pub struct Neo4jClient {
    graph: Graph,
    uri: String,
}

impl Neo4jClient {
    /// Connect and verify the server answers before returning.
    pub async fn connect(config: &Neo4jConfig) -> Result<Self> {
        let driver_config = ConfigBuilder::default()
            .uri(config.uri.as_str())
            .user(config.user.as_str())
            .password(config.password.as_str())
            .db(config.database.as_str())
            .max_connections(config.max_connection_pool_size)
            .fetch_size(config.fetch_size)
            .build()
            .map_err(|e| connection_error(&config.uri, e))?;

        let graph = Graph::connect(driver_config)
            .await
            .map_err(|e| connection_error(&config.uri, e))?;

        graph
            .run(Query::new("RETURN 1".to_string()))
            .await
            .map_err(|e| connection_error(&config.uri, e))?;

        info!(uri = %config.uri, database = %config.database, "neo4j connected");

        Ok(Self {
            graph,
            uri: config.uri.clone(),
        })
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Run a parameterised query and collect every row.
    pub async fn execute_query(&self, query: &str, params: Vec<(&str, BoltType)>) -> Result<Vec<Row>> {
        let mut q = Query::new(query.to_string());
        for (key, value) in params {
            q = q.param(key, value);
        }

        let rows = self.collect_rows(q).await.map_err(|e| {
            error!(query = %truncate(query.trim(), LOGGED_QUERY_CHARS), error = %e, "query failed");
            GraphError::Connection(format!(
                "Query execution failed: {}",
                truncate(&e.to_string(), ERROR_MESSAGE_CHARS)
            ))
        })?;

        debug!(
            query = %truncate(query.trim(), LOGGED_QUERY_CHARS),
            results = rows.len(),
            "query executed"
        );

        Ok(rows)
    }

    async fn collect_rows(&self, query: Query) -> std::result::Result<Vec<Row>, neo4rs::Error> {
        let mut result = self.graph.execute(query).await?;
        let mut rows = Vec::new();
        while let Some(row) = result.next().await? {
            rows.push(row);
        }
        Ok(rows)
    }

    async fn nodes(&self, query: &str, params: Vec<(&str, BoltType)>) -> Result<Vec<NodeRecord>> {
        self.execute_query(query, params)
            .await?
            .iter()
            .map(node_from_row)
            .collect()
    }

    async fn count(&self, query: &str) -> Result<usize> {
        let rows = self.execute_query(query, Vec::new()).await?;
        match rows.first() {
            Some(row) => Ok(get::<i64>(row, "count")?.max(0) as usize),
            None => Ok(0),
        }
    }
}

#[async_trait]
impl GraphStore for Neo4jClient {
    fn backend(&self) -> &'static str {
        "neo4j"
    }

    async fn create_node(&self, label: EntityType, properties: Properties) -> Result<Option<NodeRecord>> {
        let id = required_id(&properties)?;
        let query = format!(
            "MERGE (n:{} {{id: $id}}) SET n += $properties RETURN {}",
            label.as_label(),
            NODE_PROJECTION
        );

        let rows = self
            .nodes(
                &query,
                vec![("id", id.as_str().into()), ("properties", property_map(&properties))],
            )
            .await?;

        Ok(rows.into_iter().next())
    }

    async fn create_relationship(
        &self,
        source_id: &str,
        target_id: &str,
        rel_type: RelationType,
        properties: Properties,
    ) -> Result<Option<EdgeRecord>> {
        let query = format!(
            r#"
            MATCH (source {{id: $source_id}})
            MATCH (target {{id: $target_id}})
            MERGE (source)-[r:{}]->(target)
            SET r += $properties
            RETURN {}
            "#,
            rel_type.as_label(),
            EDGE_PROJECTION
        );

        let rows = self
            .execute_query(
                &query,
                vec![
                    ("source_id", source_id.into()),
                    ("target_id", target_id.into()),
                    ("properties", property_map(&properties)),
                ],
            )
            .await?;

        rows.first().map(edge_from_row).transpose()
    }

    async fn find_node(
        &self,
        label: EntityType,
        property_key: &str,
        property_value: &Value,
    ) -> Result<Option<NodeRecord>> {
        validate_identifier(property_key)?;
        let query = format!(
            "MATCH (n:{} {{{}: $value}}) RETURN {} LIMIT 1",
            label.as_label(),
            property_key,
            NODE_PROJECTION
        );

        let rows = self.nodes(&query, vec![("value", to_bolt(property_value))]).await?;
        Ok(rows.into_iter().next())
    }

    async fn create_index(&self, label: EntityType) -> Result<()> {
        let name = label.as_label().to_lowercase();
        let query = format!(
            "CREATE INDEX {}_id_index IF NOT EXISTS FOR (n:{}) ON (n.id)",
            name,
            label.as_label()
        );
        self.execute_query(&query, Vec::new()).await?;
        Ok(())
    }

    async fn shortest_path(
        &self,
        source_id: &str,
        target_id: &str,
        max_hops: usize,
    ) -> Result<Option<PathRecord>> {
        crate::config::validate_hops(max_hops)?;
        let query = format!(
            r#"
            MATCH path = shortestPath(
                (source {{id: $source_id}})-[*..{}]-(target {{id: $target_id}})
            )
            RETURN [n IN nodes(path) | {{labels: labels(n), properties: properties(n)}}] AS nodes,
                   [r IN relationships(path) | {{
                       source: coalesce(startNode(r).id, ''),
                       target: coalesce(endNode(r).id, ''),
                       type: type(r),
                       properties: properties(r)
                   }}] AS edges
            "#,
            max_hops
        );

        let rows = self
            .execute_query(
                &query,
                vec![("source_id", source_id.into()), ("target_id", target_id.into())],
            )
            .await?;

        let Some(row) = rows.first() else {
            return Ok(None);
        };

        Ok(Some(PathRecord {
            nodes: get(row, "nodes")?,
            edges: get(row, "edges")?,
        }))
    }

    async fn related(
        &self,
        entity_id: &str,
        relation_types: &[RelationType],
        limit: usize,
    ) -> Result<Vec<RelatedRecord>> {
        let pattern = if relation_types.is_empty() {
            "[r]".to_string()
        } else {
            let types: Vec<&str> = relation_types.iter().map(|t| t.as_label()).collect();
            format!("[r:{}]", types.join("|"))
        };
        let query = format!(
            r#"
            MATCH (source {{id: $entity_id}})-{}-(n)
            RETURN {}, type(r) AS relation_type
            LIMIT $limit
            "#,
            pattern, NODE_PROJECTION
        );

        let rows = self
            .execute_query(
                &query,
                vec![("entity_id", entity_id.into()), ("limit", (limit as i64).into())],
            )
            .await?;

        rows.iter()
            .map(|row| {
                Ok(RelatedRecord {
                    node: node_from_row(row)?,
                    relation_type: get(row, "relation_type")?,
                })
            })
            .collect()
    }

    async fn search_text(
        &self,
        search_text: &str,
        entity_types: &[EntityType],
        limit: usize,
    ) -> Result<Vec<NodeRecord>> {
        let pattern = if entity_types.is_empty() {
            "(n)".to_string()
        } else {
            let labels: Vec<&str> = entity_types.iter().map(|t| t.as_label()).collect();
            format!("(n:{})", labels.join("|"))
        };
        let query = format!(
            r#"
            MATCH {}
            WHERE toLower(n.text) CONTAINS toLower($search_text)
            RETURN {}
            LIMIT $limit
            "#,
            pattern, NODE_PROJECTION
        );

        self.nodes(
            &query,
            vec![("search_text", search_text.into()), ("limit", (limit as i64).into())],
        )
        .await
    }

    async fn stats(&self) -> Result<GraphStats> {
        Ok(GraphStats {
            node_count: self.count("MATCH (n) RETURN count(n) AS count").await?,
            relationship_count: self.count("MATCH ()-[r]->() RETURN count(r) AS count").await?,
        })
    }
}

fn connection_error(uri: &str, e: neo4rs::Error) -> GraphError {
    GraphError::Connection(format!(
        "Failed to connect to Neo4j at {}: {}",
        uri,
        truncate(&e.to_string(), ERROR_MESSAGE_CHARS)
    ))
}

fn get<T: DeserializeOwned>(row: &Row, key: &str) -> Result<T> {
    row.get::<T>(key)
        .map_err(|e| GraphError::Connection(format!("Unexpected value for column {}: {}", key, e)))
}

fn node_from_row(row: &Row) -> Result<NodeRecord> {
    Ok(NodeRecord {
        labels: get(row, "labels")?,
        properties: get(row, "properties")?,
    })
}

fn edge_from_row(row: &Row) -> Result<EdgeRecord> {
    Ok(EdgeRecord {
        source: get(row, "source")?,
        target: get(row, "target")?,
        rel_type: get(row, "type")?,
        properties: get(row, "properties")?,
    })
}

/// Property maps go over the wire as Bolt maps. Neo4j cannot store nested
/// maps as properties, so those are sent as their JSON text.
fn property_map(properties: &Properties) -> BoltType {
    let mut map = BoltMap::new();
    for (key, value) in properties {
        let bolt = match value {
            Value::Object(_) => BoltType::String(BoltString::new(&value.to_string())),
            other => to_bolt(other),
        };
        map.put(BoltString::new(key), bolt);
    }
    BoltType::Map(map)
}

fn to_bolt(value: &Value) -> BoltType {
    match value {
        Value::Null => BoltType::Null(BoltNull),
        Value::Bool(b) => BoltType::Boolean(BoltBoolean::new(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => BoltType::Integer(BoltInteger::new(i)),
            None => BoltType::Float(BoltFloat::new(n.as_f64().unwrap_or_default())),
        },
        Value::String(s) => BoltType::String(BoltString::new(s)),
        Value::Array(items) => {
            let mut list = BoltList::new();
            for item in items {
                list.push(to_bolt(item));
            }
            BoltType::List(list)
        }
        Value::Object(entries) => {
            let mut map = BoltMap::new();
            for (key, item) in entries {
                map.put(BoltString::new(key), to_bolt(item));
            }
            BoltType::Map(map)
        }
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_truncate_counts_characters() {
        assert_eq!(truncate("héllo world", 5), "héllo");
        assert_eq!(truncate("short", 100), "short");
    }

    #[test]
    fn test_to_bolt_scalars() {
        assert!(matches!(to_bolt(&json!(null)), BoltType::Null(_)));
        assert!(matches!(to_bolt(&json!(3)), BoltType::Integer(_)));
        assert!(matches!(to_bolt(&json!(0.8)), BoltType::Float(_)));
        assert!(matches!(to_bolt(&json!("x")), BoltType::String(_)));
        assert!(matches!(to_bolt(&json!([1, 2])), BoltType::List(_)));
    }

    #[test]
    fn test_property_map_flattens_nested_maps() {
        let mut properties = Properties::new();
        properties.insert("id".to_string(), json!("n1"));
        properties.insert("source".to_string(), json!({"page": 3}));

        let BoltType::Map(map) = property_map(&properties) else {
            panic!("expected a map");
        };
        assert_eq!(
            map.value.get(&BoltString::new("source")),
            Some(&BoltType::String(BoltString::new(r#"{"page":3}"#)))
        );
    }
}
