use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use extract::RelationType;
use graph::GraphPath;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum QueryIntent {
    Factual,
    Comparative,
    Causal,
    Procedural,
    Exploratory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryAnalysis {
    pub intent: QueryIntent,
    pub key_entities: Vec<String>,
    pub required_relations: Vec<RelationType>,
    pub sub_queries: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReasoningStep {
    /// 1-based position in the trace.
    pub step_number: usize,
    pub description: String,
    pub action: String,
    pub result: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub document_id: String,
    pub title: String,
    pub chunk_id: Option<String>,
    pub page: Option<u32>,
    pub confidence: f64,
}

/// Everything accumulated while answering one query.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReasoningState {
    pub query: String,
    pub query_analysis: Option<QueryAnalysis>,
    pub graph_context: String,
    pub reasoning_steps: Vec<ReasoningStep>,
    pub current_answer: String,
    pub graph_path: Option<GraphPath>,
    pub sources: Vec<Source>,
    pub is_complete: bool,
}

impl ReasoningState {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }
}
