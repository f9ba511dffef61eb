//! Code chunk production: slice each function's source range out of
//! its file and hand the chunks to the embedding and vector adapters.

use crate::cache::FileContentCache;
use crate::error::{AnalyzerError, Result};
use crate::model::{CodeModel, FunctionId};
use graph_store::{ChunkScope, CodeChunk, EmbeddingClient, EmbeddingRequest, VectorStore};
use tracing::info;

pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

/// Builds chunk records from function source slices.
pub struct ChunkBuilder<'a> {
    cache: &'a FileContentCache,
}

impl<'a> ChunkBuilder<'a> {
    pub fn new(cache: &'a FileContentCache) -> Self {
        Self { cache }
    }

    /// Chunk for one function. Functions without a body, out-of-range
    /// slices and empty content produce no chunk.
    pub fn build(&self, model: &CodeModel, function: FunctionId) -> Option<CodeChunk> {
        let data = model.function(function);
        data.body.as_ref()?;
        let file = model.file(data.file);
        let bytes = self.cache.read(&file.path).ok()?;
        if data.start_byte >= data.end_byte || data.end_byte > bytes.len() {
            return None;
        }
        let content = String::from_utf8_lossy(&bytes[data.start_byte..data.end_byte]).to_string();
        if content.is_empty() {
            return None;
        }
        Some(CodeChunk {
            id: data.id.clone(),
            path: file.id.clone(),
            content,
            document: data.document.clone(),
            scope: ChunkScope::Function,
            vector: Vec::new(),
        })
    }
}

/// Embeds every function chunk of a model and persists them to the
/// vector store, collection keyed by repository name and partitioned by
/// repository ID.
pub struct Indexer<'a> {
    embedding: &'a dyn EmbeddingClient,
    vectors: &'a dyn VectorStore,
    cache: &'a FileContentCache,
    model_name: String,
}

impl<'a> Indexer<'a> {
    pub fn new(
        embedding: &'a dyn EmbeddingClient,
        vectors: &'a dyn VectorStore,
        cache: &'a FileContentCache,
    ) -> Self {
        Self {
            embedding,
            vectors,
            cache,
            model_name: DEFAULT_EMBEDDING_MODEL.to_string(),
        }
    }

    pub fn with_model(mut self, model_name: impl Into<String>) -> Self {
        self.model_name = model_name.into();
        self
    }

    /// Returns how many chunks were embedded and saved. Embedding
    /// failures abort the entire indexing run.
    pub fn index(&self, model: &CodeModel) -> Result<usize> {
        if !self.embedding.enabled() {
            return Err(AnalyzerError::NotSupportLlm(
                "code indexing requires an embedding client".to_string(),
            ));
        }
        let builder = ChunkBuilder::new(self.cache);
        let mut chunks = Vec::new();
        for function in model.function_ids() {
            let mut chunk = match builder.build(model, function) {
                Some(chunk) => chunk,
                None => continue,
            };
            chunk.vector = self.embedding.embed(&EmbeddingRequest {
                model: self.model_name.clone(),
                input: chunk.content.clone(),
            })?;
            chunks.push(chunk);
        }
        self.vectors
            .save_code_chunks(&model.repo_name, &model.repo_id, &chunks)?;
        info!(chunks = chunks.len(), repo = %model.repo_id, "indexed code chunks");
        Ok(chunks.len())
    }
}
