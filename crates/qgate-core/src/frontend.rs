//! Seam between language front ends and the analysis core.

use crate::ast::SourceUnit;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// The front end could not produce a tree for a file.
///
/// The engine treats this as "skip the file": zero violations, counted in
/// `files_skipped`, never fatal.
#[derive(Debug, Error)]
#[error("cannot parse {}: {reason}", path.display())]
pub struct ParseUnavailable {
    /// File that failed.
    pub path: PathBuf,
    /// Why it failed (syntax error location, decoding problem, ...).
    pub reason: String,
}

impl ParseUnavailable {
    /// Creates a new error.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Turns source text into a [`SourceUnit`].
///
/// Implementations must be shareable across the worker pool; keep per-parse
/// state (parsers, cursors) local to [`SourceParser::parse`].
pub trait SourceParser: Send + Sync {
    /// Language identifier (e.g., "python").
    fn language_id(&self) -> &'static str;

    /// File extensions this parser handles, without the dot.
    fn extensions(&self) -> &'static [&'static str];

    /// Parses one file.
    ///
    /// # Errors
    ///
    /// Returns [`ParseUnavailable`] if the source has syntax errors.
    fn parse(&self, path: &Path, source: &str) -> Result<SourceUnit, ParseUnavailable>;
}
