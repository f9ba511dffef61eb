//! The vector-store adapter boundary and chunk records.

use crate::error::StoreError;
use serde::{Deserialize, Serialize};

/// Granularity of a code chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChunkScope {
    File,
    Function,
    Package,
    Project,
}

impl ChunkScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChunkScope::File => "file",
            ChunkScope::Function => "function",
            ChunkScope::Package => "pkg",
            ChunkScope::Project => "project",
        }
    }
}

/// A semantic unit (typically one function) with its source slice and a
/// fixed-dimension embedding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeChunk {
    pub id: String,
    /// Owning file's graph ID.
    pub path: String,
    pub content: String,
    pub document: String,
    pub scope: ChunkScope,
    pub vector: Vec<f32>,
}

#[derive(Debug, Clone)]
pub struct SearchCodeChunksRequest {
    pub collection: String,
    pub partition: String,
    pub vector: Vec<f32>,
    pub limit: usize,
}

pub trait VectorStore: Send + Sync {
    fn save_code_chunks(
        &self,
        collection: &str,
        partition: &str,
        chunks: &[CodeChunk],
    ) -> Result<(), StoreError>;

    /// Top-K approximate nearest neighbour search.
    fn search_code_chunks(
        &self,
        request: &SearchCodeChunksRequest,
    ) -> Result<Vec<CodeChunk>, StoreError>;

    /// Exact lookup by chunk IDs.
    fn search_code_chunks_by_ids(
        &self,
        collection: &str,
        ids: &[String],
        limit: usize,
    ) -> Result<Vec<CodeChunk>, StoreError>;
}
