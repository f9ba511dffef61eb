//! Embedding and LLM adapter boundaries.

use crate::error::StoreError;
use serde::{Deserialize, Serialize};
use std::sync::mpsc::Sender;

#[derive(Debug, Clone)]
pub struct EmbeddingRequest {
    pub model: String,
    pub input: String,
}

/// Produces fixed-dimension float vectors for text.
pub trait EmbeddingClient: Send + Sync {
    /// Whether the backing service is configured at all. Callers must
    /// check before issuing requests.
    fn enabled(&self) -> bool;

    fn embed(&self, request: &EmbeddingRequest) -> Result<Vec<f32>, StoreError>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<Message>,
}

/// One element of a streamed completion. The final chunk carries
/// `is_complete = true`; a failed stream sets `error` on that final
/// chunk before the sink closes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamChunk {
    pub chunk: String,
    pub chunk_index: u32,
    pub is_complete: bool,
    pub error: Option<String>,
}

pub trait LlmClient: Send + Sync {
    fn enabled(&self) -> bool;

    /// Stream completion chunks into the sink.
    fn complete(
        &self,
        request: &CompletionRequest,
        sink: Sender<StreamChunk>,
    ) -> Result<(), StoreError>;
}
