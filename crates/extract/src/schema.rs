use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use strum::{Display, EnumString, IntoStaticStr};

use crate::text::normalize_text;

/// Entity types double as graph node labels.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, IntoStaticStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[strum(ascii_case_insensitive)]
pub enum EntityType {
    Concept,
    Author,
    Paper,
    Method,
    Dataset,
    Theory,
}

impl EntityType {
    pub const ALL: [EntityType; 6] = [
        EntityType::Concept,
        EntityType::Author,
        EntityType::Paper,
        EntityType::Method,
        EntityType::Dataset,
        EntityType::Theory,
    ];

    pub fn as_label(&self) -> &'static str {
        (*self).into()
    }
}

/// Relation types double as graph relationship types.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, IntoStaticStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[strum(ascii_case_insensitive)]
pub enum RelationType {
    Defines,
    Uses,
    Cites,
    Authored,
    Proposes,
    Validates,
    Contradicts,
    Extends,
    Mentions,
}

impl RelationType {
    pub fn as_label(&self) -> &'static str {
        (*self).into()
    }
}

fn default_confidence() -> f64 {
    1.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    /// Assigned by whoever creates the entity; never generated here.
    #[serde(default)]
    pub id: Option<String>,
    pub text: String,
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    #[serde(default = "default_confidence")]
    pub confidence: f64,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl Entity {
    pub fn new(text: impl Into<String>, entity_type: EntityType) -> Self {
        Self {
            id: None,
            text: text.into(),
            entity_type,
            confidence: default_confidence(),
            metadata: HashMap::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }

    /// Deduplication and linking key.
    pub fn normalized_text(&self) -> String {
        normalize_text(&self.text)
    }

    /// The ID when present and non-empty.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relation {
    pub source_id: String,
    pub target_id: String,
    #[serde(rename = "type")]
    pub relation_type: RelationType,
    #[serde(default = "default_confidence")]
    pub confidence: f64,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl Relation {
    pub fn new(
        source_id: impl Into<String>,
        target_id: impl Into<String>,
        relation_type: RelationType,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            target_id: target_id.into(),
            relation_type,
            confidence: default_confidence(),
            metadata: HashMap::new(),
        }
    }
}

/// Entities and relations found in one piece of text.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Extraction {
    pub entities: Vec<Entity>,
    pub relations: Vec<Relation>,
}
