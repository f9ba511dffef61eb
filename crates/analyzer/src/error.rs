use thiserror::Error;

pub type Result<T> = std::result::Result<T, AnalyzerError>;

/// Analyzer failure modes. Name resolution failures are not errors:
/// they degrade to best-effort output and never appear here.
#[derive(Error, Debug)]
pub enum AnalyzerError {
    #[error("io failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse failure in {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: parser_core::ParseError,
    },

    #[error(transparent)]
    Store(#[from] graph_store::StoreError),

    #[error("llm support is disabled: {0}")]
    NotSupportLlm(String),

    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("invalid repository: {0}")]
    InvalidRepository(String),

    #[error("analysis cancelled")]
    Cancelled,
}
