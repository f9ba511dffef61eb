//! Static analysis core: ingests a source repository, extracts symbols,
//! resolves cross-file references, and emits a typed code knowledge
//! graph plus per-function code chunks.
//!
//! Control flow: traverse → parse → extract → classify →
//! resolve-and-build-calls → match-implementations → emit. The stages
//! run sequentially over an in-memory model; only file reads, store
//! writes and embedding requests touch the outside world.

pub mod cache;
pub mod calls;
pub mod chunk;
pub mod classify;
pub mod config;
pub mod discover;
pub mod error;
pub mod extract;
pub mod implement;
pub mod model;
pub mod pipeline;
pub mod relations;
pub mod resolve;
pub mod writer;

#[cfg(test)]
pub(crate) mod testutil;

pub use config::AnalysisConfig;
pub use error::{AnalyzerError, Result};
pub use model::CodeModel;
pub use model::repository::CodeRepository;
pub use pipeline::{AnalysisReport, CodeAnalyzer};
