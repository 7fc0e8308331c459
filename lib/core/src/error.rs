use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Catalog is empty: nothing to match against")]
    EmptyCatalog,

    #[error("Embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("Index inconsistency: catalog has {catalog} jobs but index has {index} rows")]
    IndexInconsistency { catalog: usize, index: usize },

    #[error("Invalid vector dimension: expected {expected}, got {actual}")]
    InvalidDimension { expected: usize, actual: usize },

    #[error("Invalid job: {0}")]
    InvalidJob(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Failures of the text → vector boundary. Any of these fails the whole
/// batch or query that triggered the embedding.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EmbeddingError {
    #[error("embedder error: {0}")]
    Failed(String),

    #[error("embedder did not answer within {0:?}")]
    Timeout(std::time::Duration),

    #[error("text at position {position} embeds to a zero vector")]
    DegenerateText { position: usize },

    #[error("embedder returned {actual} vectors for {expected} texts")]
    CountMismatch { expected: usize, actual: usize },

    #[error("embedder returned a {actual}-dimensional vector, expected {expected}")]
    Dimension { expected: usize, actual: usize },

    #[error("{limit} embedder calls are still running")]
    Saturated { limit: usize },
}
