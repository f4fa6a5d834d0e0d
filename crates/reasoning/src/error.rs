use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReasoningError {
    #[error("Invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, ReasoningError>;
