use thiserror::Error;

/// Errors surfaced by store adapters. Batched writes are fatal to the
/// enclosing analysis; callers propagate these without retrying.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("graph store write failed: {0}")]
    Write(String),

    #[error("graph store query failed: {0}")]
    Query(String),

    #[error("vector store operation failed: {0}")]
    Vector(String),

    #[error("embedding request failed: {0}")]
    Embedding(String),

    #[error("llm completion failed: {0}")]
    Completion(String),
}
