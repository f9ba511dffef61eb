//! Parses Go source files into a typed syntax tree suitable for
//! symbol extraction and call-graph analysis.
//!
//! The concrete parser (tree-sitter) is confined to this crate; consumers
//! only see the lowered [`ast`] types and the per-file [`position`] table.

pub mod ast;
pub mod error;
mod lower;
pub mod parser;
pub mod position;

pub use error::ParseError;
pub use parser::{Language, ParsedFile, SourceParser, detect_language_from_extension};
