use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestError {
    /// Rejected before any I/O: bad chunker parameters, unsupported file type.
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Failed to load document {path}: {message}")]
    Load { path: String, message: String },
}

impl IngestError {
    pub fn load(path: impl std::fmt::Display, message: impl Into<String>) -> Self {
        Self::Load {
            path: path.to_string(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, IngestError>;
