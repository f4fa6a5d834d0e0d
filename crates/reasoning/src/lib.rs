pub mod analysis;
pub mod config;
pub mod cot_engine;
pub mod error;
pub mod explain;
pub mod flow;
pub mod llm;
pub mod prompts;
pub mod query_analyzer;
pub mod retry;

pub use analysis::{QueryAnalysis, QueryIntent, ReasoningState, ReasoningStep, Source};
pub use config::{LlmConfig, LlmProvider, ReasoningConfig, RetryConfig};
pub use cot_engine::ChainOfThoughtEngine;
pub use error::ReasoningError;
pub use explain::{GraphVisualizer, ReasoningFormatter};
pub use flow::ReasoningFlow;
pub use llm::{
    AnthropicGenerator, OllamaGenerator, OpenAiGenerator, RetryingGenerator, TextGenerator,
    build_generator,
};
pub use query_analyzer::QueryAnalyzer;
pub use retry::RetryPolicy;
