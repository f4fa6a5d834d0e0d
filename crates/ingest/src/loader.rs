use lopdf::Document;
use std::path::Path;
use std::time::UNIX_EPOCH;
use tokio::fs;
use tracing::info;

use crate::error::{IngestError, Result};
use crate::generate_id;

pub const SUPPORTED_EXTENSIONS: &[&str] = &["pdf", "txt", "md", "markdown"];

pub struct DocumentLoader;

impl DocumentLoader {
    pub fn is_supported(path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| SUPPORTED_EXTENSIONS.contains(&e.to_lowercase().as_str()))
            .unwrap_or(false)
    }

    /// Load a document, returning `(document_id, text)`.
    ///
    /// The document ID hashes the file name together with its modification
    /// time, so re-saving a file yields a new document.
    pub async fn load_document(path: &Path) -> Result<(String, String)> {
        let metadata = fs::metadata(path)
            .await
            .map_err(|_| IngestError::load(path.display(), "File not found"))?;

        if !metadata.is_file() {
            return Err(IngestError::load(path.display(), "Not a file"));
        }

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        if !SUPPORTED_EXTENSIONS.contains(&extension.as_str()) {
            return Err(IngestError::Validation(format!(
                "Unsupported file type: .{}. Supported types: {:?}",
                extension, SUPPORTED_EXTENSIONS
            )));
        }

        let content = if extension == "pdf" {
            Self::load_pdf(path).await?
        } else {
            Self::load_text(path).await?
        };

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let mtime = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0);

        let document_id = generate_id(&format!("{}_{}", file_name, mtime));

        Ok((document_id, content))
    }

    async fn load_text(path: &Path) -> Result<String> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| IngestError::load(path.display(), e.to_string()))?;

        info!(
            file = %path.display(),
            chars = content.chars().count(),
            "loaded text"
        );

        Ok(content)
    }

    /// Text of every page that has any, joined by blank lines.
    async fn load_pdf(path: &Path) -> Result<String> {
        let bytes = fs::read(path)
            .await
            .map_err(|e| IngestError::load(path.display(), e.to_string()))?;

        let document = Document::load_mem(&bytes)
            .map_err(|e| IngestError::load(path.display(), format!("Failed to load PDF: {}", e)))?;

        let pages: Vec<u32> = document.get_pages().keys().copied().collect();
        let mut parts = Vec::with_capacity(pages.len());

        for page in &pages {
            let text = document.extract_text(&[*page]).map_err(|e| {
                IngestError::load(path.display(), format!("Failed to read PDF page {}: {}", page, e))
            })?;
            if !text.trim().is_empty() {
                parts.push(text);
            }
        }

        let content = parts.join("\n\n");

        info!(
            file = %path.display(),
            pages = pages.len(),
            chars = content.chars().count(),
            "loaded pdf"
        );

        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_load_text_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.md");
        std::fs::write(&path, "Graph Theory basics").unwrap();

        let (document_id, text) = DocumentLoader::load_document(&path).await.unwrap();

        assert_eq!(text, "Graph Theory basics");
        assert_eq!(document_id.len(), 16);
    }

    #[tokio::test]
    async fn test_missing_file_is_a_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = DocumentLoader::load_document(&dir.path().join("absent.txt")).await;

        assert!(matches!(result, Err(IngestError::Load { .. })));
    }

    #[tokio::test]
    async fn test_directory_is_a_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = DocumentLoader::load_document(dir.path()).await;

        assert!(matches!(result, Err(IngestError::Load { .. })));
    }

    #[tokio::test]
    async fn test_unsupported_extension_is_a_validation_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("table.csv");
        std::fs::write(&path, "a,b").unwrap();

        let result = DocumentLoader::load_document(&path).await;
        assert!(matches!(result, Err(IngestError::Validation(_))));
    }

    #[tokio::test]
    async fn test_load_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("paper.pdf");
        write_pdf(&path, "Graph Theory basics");

        let (document_id, text) = DocumentLoader::load_document(&path).await.unwrap();

        assert!(text.contains("Graph Theory basics"));
        assert_eq!(document_id.len(), 16);
    }

    #[tokio::test]
    async fn test_corrupt_pdf_is_a_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.pdf");
        std::fs::write(&path, "not a pdf at all").unwrap();

        let result = DocumentLoader::load_document(&path).await;
        assert!(matches!(result, Err(IngestError::Load { .. })));
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_a_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("latin1.txt");
        std::fs::write(&path, [0x66, 0x6f, 0xff, 0xfe]).unwrap();

        let result = DocumentLoader::load_document(&path).await;
        assert!(matches!(result, Err(IngestError::Load { .. })));
    }

    #[test]
    fn test_is_supported() {
        assert!(DocumentLoader::is_supported(Path::new("a/b/paper.TXT")));
        assert!(DocumentLoader::is_supported(Path::new("readme.markdown")));
        assert!(DocumentLoader::is_supported(Path::new("scan.pdf")));
        assert!(!DocumentLoader::is_supported(Path::new("Makefile")));
    }
}

/// Single-page PDF with one line of Helvetica text.
#[cfg(test)]
pub(crate) fn write_pdf(path: &Path, text: &str) {
    use lopdf::content::{Content, Operation};
    use lopdf::{Object, Stream, dictionary};

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });
    let content = Content {
        operations: vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 24.into()]),
            Operation::new("Td", vec![72.into(), 720.into()]),
            Operation::new("Tj", vec![Object::string_literal(text)]),
            Operation::new("ET", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "Resources" => resources_id,
    });
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => vec![page_id.into()],
        "Count" => 1,
        "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path).unwrap();
}
