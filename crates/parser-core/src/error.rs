use thiserror::Error;

/// Errors reported by the parser adapter.
#[derive(Error, Debug)]
pub enum ParseError {
    /// The grammar could not be loaded into the parser.
    #[error("failed to load grammar: {0}")]
    Grammar(#[from] tree_sitter::LanguageError),

    /// The parser gave up on the file entirely.
    #[error("failed to parse source: {path:?}")]
    Unparseable { path: Option<String> },

    /// The requested language has no parser.
    #[error("unsupported language: {0}")]
    UnsupportedLanguage(String),
}
