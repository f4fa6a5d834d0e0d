use tracing::info;

use crate::analysis::ReasoningStep;

const QUERY_PREVIEW_CHARS: usize = 50;
const CONTEXT_PREVIEW_CHARS: usize = 100;

/// Produces the fixed three-step trace exposed alongside every answer.
#[derive(Debug, Clone)]
pub struct ChainOfThoughtEngine {
    min_confidence: f64,
}

impl ChainOfThoughtEngine {
    pub fn new(min_confidence: f64) -> Self {
        Self { min_confidence }
    }

    pub fn generate_reasoning_steps(&self, query: &str, graph_context: &str) -> Vec<ReasoningStep> {
        let steps = vec![
            ReasoningStep {
                step_number: 1,
                description: "Identify key concepts in the question".to_string(),
                action: "concept_extraction".to_string(),
                result: format!(
                    "Extracted concepts from: {}...",
                    preview(query, QUERY_PREVIEW_CHARS)
                ),
                confidence: 0.9,
            },
            ReasoningStep {
                step_number: 2,
                description: "Search knowledge graph for relevant information".to_string(),
                action: "graph_query".to_string(),
                result: format!(
                    "Found context: {}...",
                    preview(graph_context, CONTEXT_PREVIEW_CHARS)
                ),
                confidence: 0.85,
            },
            ReasoningStep {
                step_number: 3,
                description: "Synthesize answer from graph data".to_string(),
                action: "synthesis".to_string(),
                result: "Combining information to form coherent answer".to_string(),
                confidence: 0.8,
            },
        ];

        info!(total_steps = steps.len(), "reasoning steps generated");

        steps
    }

    /// A trace is consistent when its mean step confidence reaches the
    /// configured minimum. An empty trace never is.
    pub fn verify_consistency(&self, steps: &[ReasoningStep]) -> bool {
        if steps.is_empty() {
            return false;
        }

        let avg_confidence = steps.iter().map(|s| s.confidence).sum::<f64>() / steps.len() as f64;
        let consistent = avg_confidence >= self.min_confidence;

        info!(
            steps = steps.len(),
            avg_confidence,
            consistent,
            "reasoning verified"
        );

        consistent
    }
}

fn preview(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
