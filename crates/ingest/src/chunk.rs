use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::generate_id;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub id: String,
    pub document_id: String,
    pub text: String,
    /// Half-open character range `[start_char, end_char)` into the source document.
    pub start_char: usize,
    pub end_char: usize,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl DocumentChunk {
    pub fn new(
        document_id: &str,
        chunk_index: usize,
        text: String,
        start_char: usize,
        end_char: usize,
    ) -> Self {
        let mut metadata = HashMap::new();
        metadata.insert("chunk_index".to_string(), serde_json::json!(chunk_index));

        Self {
            id: Self::chunk_id(document_id, chunk_index),
            document_id: document_id.to_string(),
            text,
            start_char,
            end_char,
            metadata,
        }
    }

    /// Chunk IDs depend only on the parent document and the chunk position.
    pub fn chunk_id(document_id: &str, chunk_index: usize) -> String {
        generate_id(&format!("{}_{}", document_id, chunk_index))
    }

    pub fn chunk_index(&self) -> Option<usize> {
        self.metadata
            .get("chunk_index")
            .and_then(|v| v.as_u64())
            .map(|v| v as usize)
    }

    /// Estimate token count (rough: 1.3 tokens per word)
    pub fn estimated_tokens(&self) -> usize {
        let word_count = self.text.split_whitespace().count();
        (word_count as f64 * 1.3) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_id_is_positional() {
        let a = DocumentChunk::new("doc", 0, "alpha".to_string(), 0, 5);
        let b = DocumentChunk::new("doc", 0, "different text".to_string(), 0, 14);
        let c = DocumentChunk::new("doc", 1, "alpha".to_string(), 0, 5);

        assert_eq!(a.id, b.id);
        assert_ne!(a.id, c.id);
        assert_eq!(a.chunk_index(), Some(0));
    }

    #[test]
    fn test_estimated_tokens() {
        let chunk = DocumentChunk::new("doc", 0, "one two three four five six seven eight nine ten".to_string(), 0, 48);
        assert_eq!(chunk.estimated_tokens(), 13);
    }
}
