//! The parser adapter: one file in, a lowered [`GoFile`] plus its
//! position table out.

use crate::ast::GoFile;
use crate::error::ParseError;
use crate::lower;
use crate::position::LineIndex;
use serde::{Deserialize, Serialize};

/// Languages the analyzer can be asked to process. Only Go has a parser
/// today; the selector exists so repositories can carry their language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    Go,
    Java,
}

impl Language {
    /// File extension (with dot) for files of this language.
    pub fn extension(&self) -> &'static str {
        match self {
            Language::Go => ".go",
            Language::Java => ".java",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Go => "go",
            Language::Java => "java",
        }
    }
}

/// Detect the language from a file extension (without dot).
pub fn detect_language_from_extension(extension: &str) -> Option<Language> {
    match extension {
        "go" => Some(Language::Go),
        "java" => Some(Language::Java),
        _ => None,
    }
}

/// Result of parsing a single file.
#[derive(Debug, Clone)]
pub struct ParsedFile {
    pub file: GoFile,
    pub line_index: LineIndex,
}

/// Wraps the concrete tree-sitter parser. One instance per worker; the
/// underlying parser is reused across files.
pub struct SourceParser {
    parser: tree_sitter::Parser,
}

impl SourceParser {
    pub fn new(language: Language) -> Result<Self, ParseError> {
        match language {
            Language::Go => {
                let mut parser = tree_sitter::Parser::new();
                parser.set_language(&tree_sitter::Language::new(tree_sitter_go::LANGUAGE))?;
                Ok(Self { parser })
            }
            other => Err(ParseError::UnsupportedLanguage(other.as_str().to_string())),
        }
    }

    /// Parse one file's content. Syntax errors inside the file do not
    /// fail the parse; the lowering keeps whatever was recognizable.
    pub fn parse(&mut self, source: &str, path: Option<&str>) -> Result<ParsedFile, ParseError> {
        let tree = self
            .parser
            .parse(source, None)
            .ok_or_else(|| ParseError::Unparseable {
                path: path.map(str::to_string),
            })?;

        let file = lower::lower_file(tree.root_node(), source);
        Ok(ParsedFile {
            file,
            line_index: LineIndex::new(source),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Decl, TypeDeclKind, TypeExpr};

    fn parse(source: &str) -> GoFile {
        let mut parser = SourceParser::new(Language::Go).unwrap();
        parser.parse(source, Some("test.go")).unwrap().file
    }

    #[test]
    fn parses_package_and_imports() {
        let file = parse(
            r#"package server

import (
    "fmt"
    alias "net/http"
)

import "os"
"#,
        );

        assert_eq!(file.package_name, "server");
        assert_eq!(file.imports.len(), 3);
        assert_eq!(file.imports[0].path, "fmt");
        assert!(file.imports[0].alias.is_none());
        assert_eq!(file.imports[1].path, "net/http");
        assert_eq!(file.imports[1].alias.as_deref(), Some("alias"));
        assert_eq!(file.imports[2].path, "os");
    }

    #[test]
    fn parses_struct_with_fields_and_embeds() {
        let file = parse(
            r#"package m

type Server struct {
    Base
    port int
    client *http.Client
}
"#,
        );

        let decl = match &file.decls[0] {
            Decl::Type(t) => t,
            other => panic!("expected type decl, got {other:?}"),
        };
        assert_eq!(decl.name, "Server");
        let fields = match &decl.kind {
            TypeDeclKind::Struct { fields } => fields,
            other => panic!("expected struct, got {other:?}"),
        };
        assert_eq!(fields.len(), 3);
        assert!(fields[0].name.is_none());
        assert_eq!(fields[1].name.as_deref(), Some("port"));
        assert_eq!(fields[2].name.as_deref(), Some("client"));
        assert_eq!(fields[2].type_string, "*http.Client");
        match &fields[2].type_expr {
            TypeExpr::Pointer(inner) => match inner.as_ref() {
                TypeExpr::Qualified { package, name } => {
                    assert_eq!(package, "http");
                    assert_eq!(name, "Client");
                }
                other => panic!("expected qualified type, got {other:?}"),
            },
            other => panic!("expected pointer, got {other:?}"),
        }
    }

    #[test]
    fn parses_interface_methods_and_embeds() {
        let file = parse(
            r#"package m

type ReadCloser interface {
    Reader
    Close() error
}
"#,
        );

        let decl = match &file.decls[0] {
            Decl::Type(t) => t,
            other => panic!("expected type decl, got {other:?}"),
        };
        let (methods, embedded) = match &decl.kind {
            TypeDeclKind::Interface { methods, embedded } => (methods, embedded),
            other => panic!("expected interface, got {other:?}"),
        };
        assert_eq!(methods.len(), 1);
        assert_eq!(methods[0].name, "Close");
        assert_eq!(methods[0].results.len(), 1);
        assert_eq!(embedded.len(), 1);
        match &embedded[0] {
            TypeExpr::Ident(name) => assert_eq!(name, "Reader"),
            other => panic!("expected ident embed, got {other:?}"),
        }
    }

    #[test]
    fn parses_methods_with_receivers() {
        let file = parse(
            r#"package m

func (s *Server) Start(addr string) error { return nil }

func (g Gauge[T]) Value() T { return g.v }

func Top() {}
"#,
        );

        let funcs: Vec<_> = file
            .decls
            .iter()
            .filter_map(|d| match d {
                Decl::Func(f) => Some(f),
                _ => None,
            })
            .collect();
        assert_eq!(funcs.len(), 3);
        assert_eq!(funcs[0].name, "Start");
        assert_eq!(
            funcs[0].receiver.as_ref().map(|r| r.type_name.as_str()),
            Some("Server")
        );
        assert_eq!(funcs[0].params.len(), 1);
        assert_eq!(funcs[0].results.len(), 1);
        assert_eq!(
            funcs[1].receiver.as_ref().map(|r| r.type_name.as_str()),
            Some("Gauge")
        );
        assert!(funcs[2].receiver.is_none());
    }

    #[test]
    fn function_byte_range_slices_source() {
        let source = "package m\n\nfunc Greet() string { return \"hi\" }\n";
        let file = parse(source);
        let decl = match &file.decls[0] {
            Decl::Func(f) => f,
            other => panic!("expected func, got {other:?}"),
        };
        let slice = &source[decl.range.start..decl.range.end];
        assert!(slice.starts_with("func Greet"));
        assert!(slice.ends_with('}'));
    }

    #[test]
    fn parses_value_declarations() {
        let file = parse(
            r#"package m

const MaxRetries = 3

var client = NewClient()
"#,
        );

        let values: Vec<_> = file
            .decls
            .iter()
            .filter_map(|d| match d {
                Decl::Value(v) => Some(v),
                _ => None,
            })
            .collect();
        assert_eq!(values.len(), 2);
        assert_eq!(values[0].names, vec!["MaxRetries".to_string()]);
        assert_eq!(values[1].names, vec!["client".to_string()]);
        assert_eq!(values[1].values.len(), 1);
    }

    #[test]
    fn doc_comments_attach_to_declarations() {
        let file = parse(
            r#"package m

// Greet returns a greeting.
// It never fails.
func Greet() {}
"#,
        );

        let decl = match &file.decls[0] {
            Decl::Func(f) => f,
            other => panic!("expected func, got {other:?}"),
        };
        assert_eq!(decl.doc, "Greet returns a greeting. It never fails.");
    }

    #[test]
    fn broken_source_does_not_panic() {
        let file = parse("package m\n\nfunc broken( {}\n");
        // Best-effort: whatever was recognizable is kept.
        let _ = file.decls.len();
    }
}
