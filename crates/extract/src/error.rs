use thiserror::Error;

/// Extraction itself only fails in the model-backed strategy; heuristics
/// never do.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Invalid extraction config: {0}")]
    Config(String),

    #[error("Model request failed: {0}")]
    Model(String),

    #[error("Model returned unusable JSON: {0}")]
    Parse(#[from] serde_json::Error),
}
