use serde::{Deserialize, Serialize};
use tracing::info;

use crate::chunk::DocumentChunk;
use crate::error::{IngestError, Result};

pub const DEFAULT_CHUNK_SIZE: usize = 1000;
pub const DEFAULT_OVERLAP: usize = 200;

/// Sliding-window parameters, measured in characters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkerConfig {
    pub chunk_size: usize,
    pub overlap: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            overlap: DEFAULT_OVERLAP,
        }
    }
}

impl ChunkerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(IngestError::Validation(format!(
                "Chunk size must be positive, got {}",
                self.chunk_size
            )));
        }

        if self.overlap >= self.chunk_size {
            return Err(IngestError::Validation(format!(
                "Overlap must be between 0 and chunk_size ({}), got {}",
                self.chunk_size, self.overlap
            )));
        }

        Ok(())
    }
}

pub struct Chunker {
    config: ChunkerConfig,
}

impl Chunker {
    pub fn new(config: ChunkerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ChunkerConfig {
        &self.config
    }

    pub fn chunk(&self, document_id: &str, text: &str) -> Vec<DocumentChunk> {
        sliding_window(text, document_id, self.config.chunk_size, self.config.overlap)
    }
}

/// Split `text` into overlapping windows of `chunk_size` characters.
///
/// Each window spans `[start, start + chunk_size)` clipped to the text length
/// and the next one starts `overlap` characters before the previous end.
/// Stops as soon as a window reaches the end of the text.
pub fn chunk_text(
    text: &str,
    document_id: &str,
    chunk_size: usize,
    overlap: usize,
) -> Result<Vec<DocumentChunk>> {
    ChunkerConfig { chunk_size, overlap }.validate()?;
    Ok(sliding_window(text, document_id, chunk_size, overlap))
}

fn sliding_window(
    text: &str,
    document_id: &str,
    chunk_size: usize,
    overlap: usize,
) -> Vec<DocumentChunk> {
    let chars: Vec<char> = text.chars().collect();
    let total = chars.len();
    let mut chunks = Vec::new();

    let mut start = 0;
    let mut chunk_index = 0;

    while start < total {
        let end = (start + chunk_size).min(total);
        let window: String = chars[start..end].iter().collect();

        chunks.push(DocumentChunk::new(document_id, chunk_index, window, start, end));

        chunk_index += 1;

        if end >= total {
            break;
        }
        start = end - overlap;
    }

    let avg_size = if chunks.is_empty() {
        0
    } else {
        chunks.iter().map(|c| c.end_char - c.start_char).sum::<usize>() / chunks.len()
    };
    info!(
        document_id,
        total_chunks = chunks.len(),
        avg_size,
        "chunked text"
    );

    chunks
}

/// Group sentences (split on `". "`) into chunks of at most `max_sentences`.
pub fn chunk_by_sentences(
    text: &str,
    document_id: &str,
    max_sentences: usize,
) -> Result<Vec<DocumentChunk>> {
    if max_sentences == 0 {
        return Err(IngestError::Validation(
            "max_sentences must be positive".to_string(),
        ));
    }

    if text.is_empty() {
        return Ok(Vec::new());
    }

    let sentences: Vec<&str> = text.split(". ").collect();
    let mut chunks = Vec::new();
    let mut start_char = 0;

    for (chunk_index, group) in sentences.chunks(max_sentences).enumerate() {
        let mut chunk_text = group.join(". ");
        if !chunk_text.ends_with('.') {
            chunk_text.push('.');
        }

        let end_char = start_char + chunk_text.chars().count();
        let mut chunk = DocumentChunk::new(document_id, chunk_index, chunk_text, start_char, end_char);
        chunk
            .metadata
            .insert("sentences".to_string(), serde_json::json!(group.len()));
        chunks.push(chunk);

        start_char = end_char;
    }

    Ok(chunks)
}
