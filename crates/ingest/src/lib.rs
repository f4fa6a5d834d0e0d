pub mod chunk;
pub mod chunker;
pub mod error;
pub mod loader;
pub mod pipeline;

pub use chunk::DocumentChunk;
pub use chunker::{Chunker, ChunkerConfig, chunk_by_sentences, chunk_text};
pub use error::{IngestError, Result};
pub use loader::DocumentLoader;
pub use pipeline::{DirectoryReport, IngestFailure, IngestionPipeline, discover_documents};

use sha2::{Digest, Sha256};

/// Stable 16-hex-character identifier for documents and chunks.
pub fn generate_id(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let result = hasher.finalize();
    hex::encode(&result[..8])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_id_is_stable_and_short() {
        let a = generate_id("doc_0");
        let b = generate_id("doc_0");

        assert_eq!(a, b);
        assert_eq!(a.len(), 16);
        assert_ne!(a, generate_id("doc_1"));
    }
}
