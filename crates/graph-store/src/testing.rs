//! Test doubles for the LLM-side adapters.

use crate::error::StoreError;
use crate::llm::{CompletionRequest, EmbeddingClient, EmbeddingRequest, LlmClient, StreamChunk};
use std::sync::mpsc::Sender;

/// Deterministic embedding client: hashes the input into a small
/// fixed-dimension vector. Identical inputs embed identically, which is
/// all the pipeline tests need.
pub struct StaticEmbeddingClient {
    dimension: usize,
    enabled: bool,
}

impl StaticEmbeddingClient {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            enabled: true,
        }
    }

    /// A client that reports the LLM side as unconfigured.
    pub fn disabled() -> Self {
        Self {
            dimension: 0,
            enabled: false,
        }
    }
}

impl EmbeddingClient for StaticEmbeddingClient {
    fn enabled(&self) -> bool {
        self.enabled
    }

    fn embed(&self, request: &EmbeddingRequest) -> Result<Vec<f32>, StoreError> {
        if !self.enabled {
            return Err(StoreError::Embedding("client disabled".to_string()));
        }
        let mut vector = vec![0.0f32; self.dimension];
        if self.dimension == 0 {
            return Ok(vector);
        }
        for (index, byte) in request.input.bytes().enumerate() {
            vector[index % self.dimension] += byte as f32 / 255.0;
        }
        Ok(vector)
    }
}

/// LLM client that streams a canned response in fixed-size chunks.
pub struct ScriptedLlmClient {
    response: String,
    chunk_size: usize,
}

impl ScriptedLlmClient {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            chunk_size: 16,
        }
    }
}

impl LlmClient for ScriptedLlmClient {
    fn enabled(&self) -> bool {
        true
    }

    fn complete(
        &self,
        _request: &CompletionRequest,
        sink: Sender<StreamChunk>,
    ) -> Result<(), StoreError> {
        let bytes = self.response.as_bytes();
        let mut index = 0u32;
        for piece in bytes.chunks(self.chunk_size.max(1)) {
            let chunk = StreamChunk {
                chunk: String::from_utf8_lossy(piece).to_string(),
                chunk_index: index,
                is_complete: false,
                error: None,
            };
            sink.send(chunk)
                .map_err(|e| StoreError::Completion(e.to_string()))?;
            index += 1;
        }
        sink.send(StreamChunk {
            chunk: String::new(),
            chunk_index: index,
            is_complete: true,
            error: None,
        })
        .map_err(|e| StoreError::Completion(e.to_string()))?;
        Ok(())
    }
}
