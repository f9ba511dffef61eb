//! Adapter interfaces for the stores the analyzer writes to, plus an
//! in-memory implementation with upsert semantics used by tests and the
//! CLI. Concrete database drivers live behind these traits.

pub mod error;
pub mod graph;
pub mod llm;
pub mod memory;
pub mod store;
pub mod testing;
pub mod vector;

pub use error::StoreError;
pub use graph::{
    CallRelation, EntityKind, EntityRecord, EntityWithMethods, FieldRecord, FileRecord,
    FunctionRecord, FunctionScope, ImportRecord, PackageRecord, Relation, RelationType,
};
pub use llm::{CompletionRequest, EmbeddingClient, EmbeddingRequest, LlmClient, Message, StreamChunk};
pub use memory::{MemoryGraphStore, MemoryVectorStore};
pub use store::GraphStore;
pub use vector::{ChunkScope, CodeChunk, SearchCodeChunksRequest, VectorStore};
