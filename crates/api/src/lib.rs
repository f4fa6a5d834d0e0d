pub mod assistant;
pub mod config;
pub mod context;
pub mod routes;
pub mod session;
pub mod telemetry;

pub use assistant::{Assistant, DirectoryIngestReport, DocumentReport, QueryResponse};
pub use config::AppConfig;
pub use context::{ContextConfig, ContextManager, ConversationHistory, ConversationMessage, Role};
pub use session::{InMemorySessionStore, SessionConfig, SessionStore};
