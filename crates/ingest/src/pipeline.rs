use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tracing::{error, info};
use walkdir::WalkDir;

use crate::chunk::DocumentChunk;
use crate::chunker::{Chunker, ChunkerConfig};
use crate::error::{IngestError, Result};
use crate::loader::DocumentLoader;

/// Loads documents and cuts them into overlapping chunks.
pub struct IngestionPipeline {
    chunker: Chunker,
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestFailure {
    pub path: String,
    pub error: String,
}

#[derive(Debug, Default)]
pub struct DirectoryReport {
    pub documents: BTreeMap<String, Vec<DocumentChunk>>,
    pub failures: Vec<IngestFailure>,
}

impl IngestionPipeline {
    pub fn new(config: ChunkerConfig) -> Result<Self> {
        Ok(Self {
            chunker: Chunker::new(config)?,
        })
    }

    pub async fn process_document(&self, path: &Path) -> Result<(String, Vec<DocumentChunk>)> {
        info!(file = %path.display(), "processing document");

        let (document_id, content) = DocumentLoader::load_document(path).await?;
        let chunks = self.chunker.chunk(&document_id, &content);

        info!(
            document_id = %document_id,
            chunks = chunks.len(),
            total_chars = content.chars().count(),
            "document processed"
        );

        Ok((document_id, chunks))
    }

    /// Process every supported file below `dir`; a failing file is recorded
    /// in the report and does not stop the walk. A file whose document ID
    /// collides with an earlier one is recorded as a failure too.
    pub async fn process_directory(&self, dir: &Path) -> Result<DirectoryReport> {
        let files = discover_documents(dir)?;
        let mut report = DirectoryReport::default();
        let mut sources: HashMap<String, PathBuf> = HashMap::new();

        for path in files {
            match self.process_document(&path).await {
                Ok((document_id, chunks)) => {
                    if let Some(first) = sources.get(&document_id) {
                        error!(
                            file = %path.display(),
                            document_id = %document_id,
                            "document id already produced by {}",
                            first.display()
                        );
                        report.failures.push(IngestFailure {
                            path: path.to_string_lossy().to_string(),
                            error: format!(
                                "Duplicate document id {} (already produced by {})",
                                document_id,
                                first.display()
                            ),
                        });
                        continue;
                    }
                    sources.insert(document_id.clone(), path.clone());
                    report.documents.insert(document_id, chunks);
                }
                Err(e) => {
                    error!(file = %path.display(), error = %e, "document processing failed");
                    report.failures.push(IngestFailure {
                        path: path.to_string_lossy().to_string(),
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            total_documents = report.documents.len(),
            failed = report.failures.len(),
            "directory processed"
        );

        Ok(report)
    }
}

/// Recursively list supported documents below `dir`, sorted by path.
pub fn discover_documents(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        return Err(IngestError::Validation(format!(
            "Directory not found: {}",
            dir.display()
        )));
    }

    if !dir.is_dir() {
        return Err(IngestError::Validation(format!(
            "Not a directory: {}",
            dir.display()
        )));
    }

    let files = WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| DocumentLoader::is_supported(path))
        .collect();

    Ok(files)
}
