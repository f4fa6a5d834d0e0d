use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use extract::{Entity, EntityLinker, ExtractionStrategy, Relation, build_strategy};
use graph::{BuildStats, GraphBuilder, GraphNode, GraphPath, GraphStats, GraphStore, GraphTraversal};
use ingest::{DocumentChunk, IngestFailure, IngestionPipeline};
use reasoning::prompts::{CHAIN_OF_THOUGHT_SYSTEM, render_user_prompt};
use reasoning::{
    ChainOfThoughtEngine, ReasoningFlow, ReasoningStep, RetryPolicy, Source, TextGenerator,
    build_generator,
};
use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::context::{ContextManager, ConversationHistory, Role};
use crate::session::{InMemorySessionStore, SessionStore};

pub const ANSWER_FALLBACK: &str = "I apologize, but I encountered an error generating an answer.";
pub const NO_GRAPH_CONTEXT: &str = "No graph context found.";
pub const NO_HISTORY: &str = "No previous conversation.";

const RESPONSE_CONFIDENCE: f64 = 0.85;
const SEARCHED_ENTITIES: usize = 3;
const RESULTS_PER_ENTITY: usize = 5;

#[derive(Debug, Clone, Serialize)]
pub struct DocumentReport {
    pub document_id: String,
    pub chunks: usize,
    pub entities: usize,
    pub relations: usize,
    pub graph: BuildStats,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DirectoryIngestReport {
    pub documents: Vec<DocumentReport>,
    pub failures: Vec<IngestFailure>,
}

#[derive(Debug, Clone, Serialize)]
pub struct QueryResponse {
    pub query: String,
    pub answer: String,
    /// Empty unless reasoning was requested.
    pub reasoning_trace: Vec<ReasoningStep>,
    pub graph_path: Option<GraphPath>,
    pub sources: Vec<Source>,
    pub confidence: f64,
    pub consistent: bool,
    pub session_id: String,
    pub timestamp: DateTime<Utc>,
}

/// Ingestion and question answering over one graph store.
pub struct Assistant {
    pipeline: IngestionPipeline,
    strategy: Box<dyn ExtractionStrategy>,
    store: Arc<dyn GraphStore>,
    builder: GraphBuilder,
    traversal: GraphTraversal,
    flow: ReasoningFlow,
    generator: Arc<dyn TextGenerator>,
    context: ContextManager,
    history_window: usize,
    verify_consistency: bool,
}

impl Assistant {
    pub fn new(
        config: &AppConfig,
        store: Arc<dyn GraphStore>,
        generator: Arc<dyn TextGenerator>,
        sessions: Arc<dyn SessionStore>,
    ) -> Result<Self> {
        config.validate()?;

        let pipeline = IngestionPipeline::new(config.ingestion.clone())?;
        let engine = ChainOfThoughtEngine::new(config.graph.min_confidence);
        let ttl = Duration::from_secs(config.session.ttl_secs);

        Ok(Self {
            pipeline,
            strategy: build_strategy(&config.extraction),
            builder: GraphBuilder::new(store.clone()),
            traversal: GraphTraversal::new(store.clone(), &config.graph),
            store,
            flow: ReasoningFlow::new(engine, config.reasoning.max_steps),
            generator,
            context: ContextManager::new(sessions, config.context.clone(), Some(ttl)),
            history_window: config.context.history_window,
            verify_consistency: config.reasoning.verify_consistency,
        })
    }

    /// Connect the configured graph backend and language model.
    pub async fn from_config(config: &AppConfig) -> Result<Self> {
        let store = graph::connect(&config.neo4j, &config.graph)
            .await
            .context("Failed to open graph store")?;

        let generator = build_generator(&config.llm, RetryPolicy::from_config(&config.retry))?;
        let sessions = Arc::new(InMemorySessionStore::new(&config.session));

        info!(
            backend = store.backend(),
            strategy = ?config.extraction.strategy,
            provider = %config.llm.provider,
            model = %config.llm.model,
            "assistant initialized"
        );

        Self::new(config, store, generator, sessions)
    }

    pub fn store(&self) -> &Arc<dyn GraphStore> {
        &self.store
    }

    pub async fn ingest_document(&self, path: &Path) -> Result<DocumentReport> {
        let (document_id, chunks) = self.pipeline.process_document(path).await?;
        self.index_chunks(document_id, &chunks).await
    }

    /// Per-document failures, whether loading or graph writes, are recorded
    /// and the remaining documents are still ingested.
    pub async fn ingest_directory(&self, dir: &Path) -> Result<DirectoryIngestReport> {
        let processed = self.pipeline.process_directory(dir).await?;
        let mut report = DirectoryIngestReport {
            failures: processed.failures,
            ..Default::default()
        };

        for (document_id, chunks) in processed.documents {
            match self.index_chunks(document_id.clone(), &chunks).await {
                Ok(document) => report.documents.push(document),
                Err(e) => {
                    error!(document_id = %document_id, error = %e, "document indexing failed");
                    report.failures.push(IngestFailure {
                        path: document_id,
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            documents = report.documents.len(),
            failed = report.failures.len(),
            "directory ingested"
        );

        Ok(report)
    }

    async fn index_chunks(&self, document_id: String, chunks: &[DocumentChunk]) -> Result<DocumentReport> {
        let (entities, relations) = self.extract_chunks(&document_id, chunks).await;
        let graph = self.builder.build_graph(&entities, &relations).await?;

        info!(
            document_id = %document_id,
            chunks = chunks.len(),
            entities = entities.len(),
            relations = relations.len(),
            "document ingested"
        );

        Ok(DocumentReport {
            document_id,
            chunks: chunks.len(),
            entities: entities.len(),
            relations: relations.len(),
            graph,
        })
    }

    /// Extract every chunk, link mentions to canonical entities and rewrite
    /// relation endpoints to the canonical IDs.
    async fn extract_chunks(&self, document_id: &str, chunks: &[DocumentChunk]) -> (Vec<Entity>, Vec<Relation>) {
        let mut entities = Vec::new();
        let mut relations = Vec::new();

        for chunk in chunks {
            match self.strategy.extract(&chunk.text).await {
                Ok(mut extraction) => {
                    for entity in &mut extraction.entities {
                        entity
                            .metadata
                            .insert("document_id".to_string(), serde_json::json!(document_id));
                        entity
                            .metadata
                            .insert("chunk_id".to_string(), serde_json::json!(chunk.id));
                    }
                    entities.extend(extraction.entities);
                    relations.extend(extraction.relations);
                }
                Err(e) => {
                    warn!(
                        chunk_id = %chunk.id,
                        strategy = self.strategy.name(),
                        error = %e,
                        "chunk extraction failed, skipped"
                    );
                }
            }
        }

        let mut linker = EntityLinker::new();
        let canonical = linker.link_entities(&entities);
        let entities = self.strategy.deduplicate(entities);

        // Endpoints move to the surviving node; relations are otherwise kept as extracted.
        let relations = relations
            .into_iter()
            .map(|mut relation| {
                if let Some(id) = canonical.get(&relation.source_id) {
                    relation.source_id = id.clone();
                }
                if let Some(id) = canonical.get(&relation.target_id) {
                    relation.target_id = id.clone();
                }
                relation
            })
            .collect();

        (entities, relations)
    }

    pub async fn ask(
        &self,
        query: &str,
        session_id: Option<&str>,
        max_hops: Option<usize>,
        include_reasoning: bool,
    ) -> Result<QueryResponse> {
        if let Some(hops) = max_hops.filter(|h| *h > 0) {
            graph::config::validate_hops(hops)?;
        }

        let session_id = session_id
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        info!(query, session_id = %session_id, "processing query");

        let mut state = self.flow.start(query);
        let key_entities = state
            .query_analysis
            .as_ref()
            .map(|a| a.key_entities.clone())
            .unwrap_or_default();

        let nodes = self.search_key_entities(&key_entities).await?;
        state.graph_context = format_graph_context(&nodes);
        state.graph_path = self.connect_matches(&nodes, max_hops).await?;
        state.sources = collect_sources(&nodes);

        let conversation = self.context.get_conversation(&session_id);
        let history = format_history(&conversation, self.history_window);

        self.flow.reason(&mut state);
        let consistent =
            !self.verify_consistency || self.flow.engine().verify_consistency(&state.reasoning_steps);

        state.current_answer = self.generate_answer(query, &state.graph_context, &history).await;

        self.context.add_message(&session_id, Role::User, query);
        let conversation = self
            .context
            .add_message(&session_id, Role::Assistant, &state.current_answer);
        if self.context.should_summarize(&conversation) {
            warn!(
                session_id = %session_id,
                tokens = conversation.token_count,
                "conversation exceeds summarization trigger"
            );
        }

        info!(
            session_id = %session_id,
            answer_length = state.current_answer.len(),
            "query processed"
        );

        Ok(QueryResponse {
            query: state.query,
            answer: state.current_answer,
            reasoning_trace: if include_reasoning {
                state.reasoning_steps
            } else {
                Vec::new()
            },
            graph_path: state.graph_path,
            sources: state.sources,
            confidence: RESPONSE_CONFIDENCE,
            consistent,
            session_id,
            timestamp: Utc::now(),
        })
    }

    async fn search_key_entities(&self, key_entities: &[String]) -> Result<Vec<GraphNode>> {
        let mut nodes = Vec::new();

        for entity in key_entities.iter().take(SEARCHED_ENTITIES) {
            let term = entity.trim_matches(|c: char| !c.is_alphanumeric());
            if term.is_empty() {
                continue;
            }
            let hits = self
                .traversal
                .search_entities_by_text(term, &[], RESULTS_PER_ENTITY)
                .await?;
            nodes.extend(hits);
        }

        Ok(nodes)
    }

    /// Shortest path between the first two distinct matched nodes, if any.
    async fn connect_matches(&self, nodes: &[GraphNode], max_hops: Option<usize>) -> Result<Option<GraphPath>> {
        let Some(first) = nodes.first() else {
            return Ok(None);
        };
        let Some(second) = nodes.iter().find(|n| n.id != first.id) else {
            return Ok(None);
        };

        Ok(self
            .traversal
            .find_shortest_path(&first.id, &second.id, max_hops)
            .await?)
    }

    async fn generate_answer(&self, query: &str, graph_context: &str, history: &str) -> String {
        let prompt = render_user_prompt(query, graph_context, history);

        match self
            .generator
            .generate(&prompt, Some(CHAIN_OF_THOUGHT_SYSTEM))
            .await
        {
            Ok(answer) => answer,
            Err(e) => {
                error!(error = %e, "answer generation failed");
                ANSWER_FALLBACK.to_string()
            }
        }
    }

    pub fn conversation(&self, session_id: &str) -> ConversationHistory {
        self.context.get_conversation(session_id)
    }

    pub fn clear_session(&self, session_id: &str) {
        self.context.clear_conversation(session_id);
    }

    pub async fn stats(&self) -> Result<GraphStats> {
        Ok(self.store.stats().await?)
    }
}

fn format_graph_context(nodes: &[GraphNode]) -> String {
    if nodes.is_empty() {
        return NO_GRAPH_CONTEXT.to_string();
    }

    nodes
        .iter()
        .map(|n| format!("Entity: {}", n.text().unwrap_or_default()))
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_history(conversation: &ConversationHistory, window: usize) -> String {
    if conversation.messages.is_empty() {
        return NO_HISTORY.to_string();
    }

    let start = conversation.messages.len().saturating_sub(window);
    conversation.messages[start..]
        .iter()
        .map(|m| format!("{}: {}", m.role, m.content))
        .collect::<Vec<_>>()
        .join("\n")
}

/// One source per document among the matched nodes.
fn collect_sources(nodes: &[GraphNode]) -> Vec<Source> {
    let mut seen = HashSet::new();

    nodes
        .iter()
        .filter_map(|node| {
            let document_id = node.properties.get("document_id")?.as_str()?;
            if !seen.insert(document_id.to_string()) {
                return None;
            }
            Some(Source {
                document_id: document_id.to_string(),
                title: node.text().unwrap_or_default().to_string(),
                chunk_id: node
                    .properties
                    .get("chunk_id")
                    .and_then(|v| v.as_str())
                    .map(str::to_string),
                page: None,
                confidence: node
                    .properties
                    .get("confidence")
                    .and_then(|v| v.as_f64())
                    .unwrap_or(RESPONSE_CONFIDENCE),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use graph::{GraphBackend, GraphError, InMemoryGraphStore};
    use std::sync::Mutex;

    /// Answers with a fixed string, or fails when `reply` is `None`.
    struct FakeGenerator {
        reply: Option<String>,
        prompts: Mutex<Vec<String>>,
    }

    impl FakeGenerator {
        fn answering(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Some(reply.to_string()),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                reply: None,
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl TextGenerator for FakeGenerator {
        async fn generate(&self, prompt: &str, _system_prompt: Option<&str>) -> anyhow::Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.reply
                .clone()
                .ok_or_else(|| anyhow::anyhow!("model unavailable"))
        }
    }

    fn assistant(generator: Arc<FakeGenerator>) -> Assistant {
        let mut config = AppConfig::default();
        config.graph.backend = GraphBackend::Memory;

        Assistant::new(
            &config,
            Arc::new(InMemoryGraphStore::new()),
            generator,
            Arc::new(InMemorySessionStore::new(&config.session)),
        )
        .unwrap()
    }

    const PAPER: &str = "Vaswani introduced Transformer models. Transformer models rely on Attention layers";

    async fn ingested(generator: Arc<FakeGenerator>) -> (tempfile::TempDir, Assistant) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("paper.txt");
        std::fs::write(&path, PAPER).unwrap();

        let assistant = assistant(generator);
        assistant.ingest_document(&path).await.unwrap();
        (dir, assistant)
    }

    #[tokio::test]
    async fn test_ingest_document_links_and_builds() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("paper.txt");
        std::fs::write(&path, PAPER).unwrap();
        let assistant = assistant(FakeGenerator::answering("ok"));

        let report = assistant.ingest_document(&path).await.unwrap();

        // Vaswani, Transformer, Attention; the repeated mention collapses.
        assert_eq!(report.chunks, 1);
        assert_eq!(report.entities, 3);
        // Proximity pairs over V, T, T, A: two V->T, one T->T, two T->A.
        assert_eq!(report.relations, 5);
        assert_eq!(report.graph.relationships_written, 5);

        // The store merges repeats on (source, target, type).
        let stats = assistant.stats().await.unwrap();
        assert_eq!(stats.node_count, 3);
        assert_eq!(stats.relationship_count, 3);
    }

    #[tokio::test]
    async fn test_repeated_entity_keeps_self_relation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("note.txt");
        std::fs::write(&path, "Einstein met Einstein").unwrap();
        let assistant = assistant(FakeGenerator::answering("ok"));

        let report = assistant.ingest_document(&path).await.unwrap();

        assert_eq!(report.entities, 1);
        assert_eq!(report.relations, 1);

        let stats = assistant.stats().await.unwrap();
        assert_eq!(stats.node_count, 1);
        assert_eq!(stats.relationship_count, 1);
    }

    #[tokio::test]
    async fn test_ingest_directory_records_failures() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), PAPER).unwrap();
        std::fs::write(dir.path().join("b.md"), "Graph Neural Networks").unwrap();
        std::fs::write(dir.path().join("bad.txt"), [0xff, 0xfe, 0x00, 0xc3]).unwrap();
        std::fs::write(dir.path().join("broken.pdf"), "not a pdf").unwrap();

        let assistant = assistant(FakeGenerator::answering("ok"));
        let report = assistant.ingest_directory(dir.path()).await.unwrap();

        assert_eq!(report.documents.len(), 2);
        assert!(report.documents.iter().all(|d| d.chunks == 1));

        let failed: Vec<&str> = report.failures.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(failed.len(), 2);
        assert!(failed[0].ends_with("bad.txt"));
        assert!(failed[1].ends_with("broken.pdf"));
        assert!(report.failures.iter().all(|f| !f.error.is_empty()));

        let missing = assistant.ingest_directory(&dir.path().join("absent")).await;
        assert!(missing.is_err());
    }

    #[tokio::test]
    async fn test_ask_uses_graph_context_and_path() {
        let generator = FakeGenerator::answering("Through the Transformer.");
        let (_dir, assistant) = ingested(generator.clone()).await;

        let response = assistant
            .ask("is Vaswani linked to Attention?", Some("s1"), None, true)
            .await
            .unwrap();

        assert_eq!(response.answer, "Through the Transformer.");
        assert_eq!(response.session_id, "s1");
        assert_eq!(response.confidence, 0.85);
        assert_eq!(response.reasoning_trace.len(), 3);
        assert!(response.consistent);
        assert_eq!(response.graph_path.as_ref().unwrap().length, 2);
        assert_eq!(response.sources.len(), 1);

        let prompt = generator.prompts.lock().unwrap()[0].clone();
        assert!(prompt.contains("Entity: Vaswani"));
        assert!(prompt.contains("Entity: Attention"));
        assert!(prompt.contains(NO_HISTORY));
    }

    #[tokio::test]
    async fn test_ask_records_history() {
        let generator = FakeGenerator::answering("Answer.");
        let assistant = assistant(generator.clone());

        assistant.ask("first question", Some("s"), None, false).await.unwrap();
        let response = assistant.ask("second question", Some("s"), None, false).await.unwrap();

        assert!(response.reasoning_trace.is_empty());
        assert!(response.graph_path.is_none());

        let conversation = assistant.conversation("s");
        assert_eq!(conversation.messages.len(), 4);
        assert_eq!(conversation.messages[0].role, Role::User);

        let prompt = generator.prompts.lock().unwrap()[1].clone();
        assert!(prompt.contains("user: first question"));
        assert!(prompt.contains("assistant: Answer."));
        assert!(prompt.contains(NO_GRAPH_CONTEXT));

        assistant.clear_session("s");
        assert!(assistant.conversation("s").messages.is_empty());
    }

    #[tokio::test]
    async fn test_history_window_limits_prompt() {
        let mut config = AppConfig::default();
        config.graph.backend = GraphBackend::Memory;
        config.context.history_window = 2;
        let generator = FakeGenerator::answering("Answer.");
        let assistant = Assistant::new(
            &config,
            Arc::new(InMemoryGraphStore::new()),
            generator.clone(),
            Arc::new(InMemorySessionStore::new(&config.session)),
        )
        .unwrap();

        assistant.ask("first question", Some("s"), None, false).await.unwrap();
        assistant.ask("second question", Some("s"), None, false).await.unwrap();
        assistant.ask("third question", Some("s"), None, false).await.unwrap();

        let prompt = generator.prompts.lock().unwrap()[2].clone();
        assert!(!prompt.contains("user: first question"));
        assert!(prompt.contains("user: second question\nassistant: Answer."));
    }

    #[tokio::test]
    async fn test_ask_falls_back_when_generation_fails() {
        let assistant = assistant(FakeGenerator::failing());

        let response = assistant.ask("anything", None, None, true).await.unwrap();

        assert_eq!(response.answer, ANSWER_FALLBACK);
        assert!(!response.session_id.is_empty());
        assert_eq!(assistant.conversation(&response.session_id).messages.len(), 2);
    }

    #[tokio::test]
    async fn test_ask_rejects_hop_bound() {
        let assistant = assistant(FakeGenerator::answering("ok"));

        let err = assistant.ask("anything", None, Some(11), true).await.unwrap_err();

        assert!(matches!(err.downcast_ref::<GraphError>(), Some(GraphError::Validation(_))));
    }
}
