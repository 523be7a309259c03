//! Python front end using Tree-sitter.

use std::path::Path;

use qgate_core::ast::AstNode;
use qgate_core::{ParseUnavailable, SourceParser, SourceUnit};
use thiserror::Error;
use tracing::trace;
use tree_sitter::{Language, Node, Parser};

use crate::lower::{Lowerer, MAX_DEPTH};

/// Why Python source could not be turned into a tree.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The grammar could not be loaded into the parser.
    #[error("failed to load python grammar: {0}")]
    Language(#[from] tree_sitter::LanguageError),

    /// Tree-sitter gave up without producing a tree.
    #[error("parser produced no tree")]
    NoTree,

    /// The source has a syntax error.
    #[error("syntax error at line {line}, column {column}")]
    Syntax {
        /// Line of the first error (1-indexed).
        line: usize,
        /// Column of the first error (1-indexed).
        column: usize,
    },

    /// The source nests deeper than the analyzer follows.
    #[error("syntax tree nests deeper than {limit} levels")]
    TooDeep {
        /// The nesting limit.
        limit: usize,
    },
}

/// Parses Python source into the generic syntax tree.
pub struct PythonParser {
    language: Language,
}

impl PythonParser {
    /// Creates a new Python parser.
    #[must_use]
    pub fn new() -> Self {
        Self {
            language: tree_sitter_python::LANGUAGE.into(),
        }
    }

    /// Parses a module and returns its top-level statements.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::Syntax`] if the source does not parse cleanly, or
    /// [`ParseError::TooDeep`] if it nests past the lowering limit.
    pub fn parse_module(&self, source: &str) -> Result<Vec<AstNode>, ParseError> {
        let mut parser = Parser::new();
        parser.set_language(&self.language)?;

        let tree = parser.parse(source, None).ok_or(ParseError::NoTree)?;
        let root = tree.root_node();
        if root.has_error() {
            let at = first_error(root).unwrap_or(root).start_position();
            return Err(ParseError::Syntax {
                line: at.row + 1,
                column: at.column + 1,
            });
        }

        let lowerer = Lowerer::new(source.as_bytes());
        let body = lowerer.block(Some(root));
        if lowerer.too_deep() {
            return Err(ParseError::TooDeep { limit: MAX_DEPTH });
        }
        trace!("lowered {} top-level statement(s)", body.len());
        Ok(body)
    }
}

impl Default for PythonParser {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceParser for PythonParser {
    fn language_id(&self) -> &'static str {
        "python"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["py"]
    }

    fn parse(&self, path: &Path, source: &str) -> Result<SourceUnit, ParseUnavailable> {
        self.parse_module(source)
            .map(|body| SourceUnit::new(path, source, body))
            .map_err(|e| ParseUnavailable::new(path, e.to_string()))
    }
}

fn first_error(root: Node<'_>) -> Option<Node<'_>> {
    let mut node = root;
    loop {
        if node.is_error() || node.is_missing() {
            return Some(node);
        }
        let mut cursor = node.walk();
        let next = node
            .children(&mut cursor)
            .find(|c| c.has_error() || c.is_missing());
        node = next?;
    }
}
