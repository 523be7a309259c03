//! # qgate-python
//!
//! Tree-sitter based Python front end for qgate.
//!
//! [`PythonParser`] implements [`qgate_core::SourceParser`]: it parses Python
//! source with `tree-sitter-python` and lowers the concrete syntax tree into
//! the language-neutral [`qgate_core::ast`] model. Files with syntax errors
//! are reported as [`qgate_core::ParseUnavailable`] and skipped by the engine.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod lower;
pub mod python;

pub use python::{ParseError, PythonParser};
