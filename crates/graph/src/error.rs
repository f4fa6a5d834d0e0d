use thiserror::Error;

#[derive(Error, Debug)]
pub enum GraphError {
    /// Graph unreachable or a query failed.
    #[error("Graph connection error: {0}")]
    Connection(String),

    /// Rejected before touching the graph.
    #[error("Graph validation error: {0}")]
    Validation(String),
}

pub type Result<T> = std::result::Result<T, GraphError>;
