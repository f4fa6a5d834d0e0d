pub mod config;
pub mod entities;
pub mod error;
pub mod linker;
pub mod llm;
pub mod prompt;
pub mod relations;
pub mod schema;
pub mod strategy;
pub mod text;

pub use config::{ExtractionConfig, ModelExtractionConfig, StrategyKind};
pub use entities::EntityExtractor;
pub use error::ExtractError;
pub use linker::EntityLinker;
pub use llm::OllamaClient;
pub use relations::{RelationExtractor, filter_by_confidence};
pub use schema::{Entity, EntityType, Extraction, Relation, RelationType};
pub use strategy::{ExtractionStrategy, HeuristicStrategy, ModelStrategy, build_strategy};
pub use text::{entity_id, normalize_text};
