use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::session::SessionStore;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    pub max_tokens: usize,
    /// Token count at which a conversation should be summarised.
    pub summarization_trigger: usize,
    /// Most recent messages replayed into the answer prompt.
    pub history_window: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            max_tokens: 3000,
            summarization_trigger: 2500,
            history_window: 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationHistory {
    pub session_id: String,
    pub messages: Vec<ConversationMessage>,
    pub token_count: usize,
    pub last_updated: DateTime<Utc>,
}

impl ConversationHistory {
    pub fn new(session_id: &str) -> Self {
        Self {
            session_id: session_id.to_string(),
            messages: Vec::new(),
            token_count: 0,
            last_updated: Utc::now(),
        }
    }
}

/// Conversation transcripts stored under `conversation:{session_id}`.
pub struct ContextManager {
    store: Arc<dyn SessionStore>,
    config: ContextConfig,
    ttl: Option<Duration>,
}

impl ContextManager {
    pub fn new(store: Arc<dyn SessionStore>, config: ContextConfig, ttl: Option<Duration>) -> Self {
        Self { store, config, ttl }
    }

    fn key(session_id: &str) -> String {
        format!("conversation:{}", session_id)
    }

    pub fn get_conversation(&self, session_id: &str) -> ConversationHistory {
        let Some(value) = self.store.get(&Self::key(session_id)) else {
            return ConversationHistory::new(session_id);
        };

        serde_json::from_value(value).unwrap_or_else(|e| {
            warn!(session_id, error = %e, "stored conversation unreadable, starting fresh");
            ConversationHistory::new(session_id)
        })
    }

    pub fn add_message(&self, session_id: &str, role: Role, content: &str) -> ConversationHistory {
        let mut conversation = self.get_conversation(session_id);
        let now = Utc::now();

        conversation.messages.push(ConversationMessage {
            role,
            content: content.to_string(),
            timestamp: now,
        });
        conversation.token_count = count_tokens(&conversation);
        conversation.last_updated = now;

        self.save(&conversation);

        info!(
            session_id,
            role = %role,
            tokens = conversation.token_count,
            "message added"
        );

        conversation
    }

    pub fn should_summarize(&self, conversation: &ConversationHistory) -> bool {
        conversation.token_count >= self.config.summarization_trigger
    }

    pub fn clear_conversation(&self, session_id: &str) {
        self.store.delete(&Self::key(session_id));
        info!(session_id, "conversation cleared");
    }

    fn save(&self, conversation: &ConversationHistory) {
        match serde_json::to_value(conversation) {
            Ok(value) => self.store.set(&Self::key(&conversation.session_id), value, self.ttl),
            Err(e) => warn!(session_id = %conversation.session_id, error = %e, "conversation not saved"),
        }
    }
}

/// Rough estimate: 1.3 tokens per whitespace-separated word.
pub fn estimate_tokens(text: &str) -> usize {
    (text.split_whitespace().count() as f64 * 1.3) as usize
}

fn count_tokens(conversation: &ConversationHistory) -> usize {
    conversation
        .messages
        .iter()
        .map(|m| estimate_tokens(&m.content))
        .sum()
}
