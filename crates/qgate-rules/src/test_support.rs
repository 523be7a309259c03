//! Shared helpers for rule tests.

use qgate_core::{ClassifierSet, FileContext, Rule, SourceParser, Thresholds, Violation};
use qgate_python::PythonParser;
use std::path::Path;

/// Parses `code` as the file at `path` and runs `rule` over it.
pub(crate) fn check_at(
    rule: &dyn Rule,
    path: &str,
    code: &str,
    thresholds: &Thresholds,
) -> Vec<Violation> {
    let unit = PythonParser::new()
        .parse(Path::new(path), code)
        .expect("Failed to parse");
    let classifiers = ClassifierSet::builtin().expect("builtin patterns");
    let ctx = FileContext::new(Path::new(path), Path::new(""), thresholds, &classifiers);
    rule.check(&ctx, &unit)
}

/// Violation type names, in emission order.
pub(crate) fn types(violations: &[Violation]) -> Vec<&'static str> {
    violations.iter().map(|v| v.violation_type.as_str()).collect()
}
