//! # qgate-rules
//!
//! Built-in quality rules for qgate.
//!
//! ## Available Rules
//!
//! | Code | Name | Description |
//! |------|------|-------------|
//! | QG001 | `complexity` | Limits complexity, nesting, length and parameters of functions |
//! | QG002 | `design-principles` | SOLID heuristics (SRP, OCP, LSP, ISP, DIP) |
//! | QG003 | `purity` | Keeps I/O, shared state and async out of functional-core code |
//! | QG004 | `error-handling` | Detects bare, silent, swallowing and nested exception handlers |
//!
//! ## Usage
//!
//! ```ignore
//! use qgate_core::Engine;
//! use qgate_python::PythonParser;
//!
//! let engine = Engine::builder()
//!     .root(".")
//!     .parser(PythonParser::new())
//!     .rules(qgate_rules::all_rules())
//!     .build()?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod complexity;
mod design;
mod error_handling;
mod presets;
mod purity;
#[cfg(test)]
mod test_support;

pub use complexity::ComplexityLimits;
pub use design::DesignPrinciples;
pub use error_handling::ErrorHandling;
pub use presets::{all_rules, find_rule, rules_for};
pub use purity::{classify_call, FunctionalPurity};

/// Re-export core types for convenience.
pub use qgate_core::{Rule, Severity, Violation};
