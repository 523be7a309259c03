//! # qgate-core
//!
//! Core framework for the qgate static quality gate.
//!
//! This crate is language-neutral. It provides:
//!
//! - [`ast`]: the generic syntax tree front ends lower into
//! - [`metrics`]: cyclomatic/cognitive complexity, nesting, size
//! - [`classify`]: the core/shell context policy
//! - [`Rule`] trait for per-file rules
//! - [`Engine`] for running rules over files and building a [`ValidationResult`]
//!
//! ## Example
//!
//! ```ignore
//! use qgate_core::Engine;
//!
//! let engine = Engine::builder()
//!     .root(".")
//!     .parser(PythonParser::new())
//!     .rules(qgate_rules::all_rules())
//!     .build()?;
//!
//! let result = engine.run(&files)?;
//! std::process::exit(if result.allowed { 0 } else { 2 });
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod ast;
pub mod classify;
mod config;
mod context;
mod engine;
mod frontend;
pub mod metrics;
pub mod report;
mod rule;
mod types;

/// Utility modules for rule implementations.
pub mod utils;

pub use ast::{AstNode, NodeKind, SourceUnit};
pub use classify::{ClassifierSet, ContextClassifier, ContextTag, ContextTags};
pub use config::{
    AnalyzerConfig, ClassifierConfig, Config, ConfigError, RuleConfig, ThresholdOverrides,
    Thresholds,
};
pub use context::FileContext;
pub use engine::{Engine, EngineBuilder, EngineError};
pub use frontend::{ParseUnavailable, SourceParser};
pub use rule::{Rule, RuleBox, RuleFamily};
pub use types::{
    is_blocking, Principle, Severity, Summary, ValidationResult, Violation, ViolationType,
};
