use tracing::info;

use crate::analysis::ReasoningState;
use crate::cot_engine::ChainOfThoughtEngine;
use crate::query_analyzer::QueryAnalyzer;

/// Drives a [`ReasoningState`] from a bare query to a finished trace.
///
/// Retrieval is left to the caller: `start` analyses the query, the caller
/// fills in `graph_context` (and optionally `graph_path`), then `reason`
/// records steps until the state is complete or `max_steps` is reached.
pub struct ReasoningFlow {
    analyzer: QueryAnalyzer,
    engine: ChainOfThoughtEngine,
    max_steps: usize,
}

impl ReasoningFlow {
    pub fn new(engine: ChainOfThoughtEngine, max_steps: usize) -> Self {
        Self {
            analyzer: QueryAnalyzer::new(),
            engine,
            max_steps,
        }
    }

    pub fn engine(&self) -> &ChainOfThoughtEngine {
        &self.engine
    }

    pub fn start(&self, query: &str) -> ReasoningState {
        let mut state = ReasoningState::new(query);
        state.query_analysis = Some(self.analyzer.analyze_query(query));

        info!(query, "reasoning started");
        state
    }

    pub fn should_continue(&self, state: &ReasoningState) -> bool {
        !state.is_complete && state.reasoning_steps.len() < self.max_steps
    }

    pub fn reason(&self, state: &mut ReasoningState) {
        let steps = self
            .engine
            .generate_reasoning_steps(&state.query, &state.graph_context);

        for step in steps {
            if !self.should_continue(state) {
                break;
            }
            state.reasoning_steps.push(step);
        }

        state.is_complete = true;

        info!(
            steps = state.reasoning_steps.len(),
            has_answer = !state.current_answer.is_empty(),
            "reasoning completed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::QueryIntent;

    #[test]
    fn test_start_attaches_analysis() {
        let flow = ReasoningFlow::new(ChainOfThoughtEngine::new(0.7), 5);
        let state = flow.start("Compare Transformer versus LSTM");

        let analysis = state.query_analysis.unwrap();
        assert_eq!(analysis.intent, QueryIntent::Comparative);
        assert!(!state.is_complete);
    }

    #[test]
    fn test_reason_records_steps_and_completes() {
        let flow = ReasoningFlow::new(ChainOfThoughtEngine::new(0.7), 5);
        let mut state = flow.start("What is BERT?");
        state.graph_context = "Entity: BERT".to_string();

        flow.reason(&mut state);

        assert!(state.is_complete);
        assert_eq!(state.reasoning_steps.len(), 3);
        assert!(!flow.should_continue(&state));
    }

    #[test]
    fn test_max_steps_caps_the_trace() {
        let flow = ReasoningFlow::new(ChainOfThoughtEngine::new(0.7), 2);
        let mut state = flow.start("What is BERT?");

        flow.reason(&mut state);

        assert_eq!(state.reasoning_steps.len(), 2);
        assert_eq!(state.reasoning_steps[1].action, "graph_query");
    }
}
