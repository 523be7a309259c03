//! Rule to limit the complexity and size of functions and files.
//!
//! # Rationale
//!
//! Long, deeply nested, branch-heavy functions are hard to read and test.
//! This rule measures every function (methods and nested functions included)
//! and reports each metric that exceeds its threshold.
//!
//! # Detected Patterns
//!
//! - Cyclomatic complexity above `warning_complexity` (warning) or
//!   `max_complexity` (error)
//! - More than `max_function_lines` lines (error)
//! - More than `max_parameters` parameters (warning)
//! - Control structures nested deeper than `max_nesting_depth` (error)
//! - Cognitive complexity above `max_cognitive_complexity` (error)
//! - Files longer than `max_file_lines` (warning)

use qgate_core::ast::{AstNode, NodeKind, Visit};
use qgate_core::metrics::{self, FunctionMetrics};
use qgate_core::{FileContext, Rule, RuleFamily, Severity, SourceUnit, Violation, ViolationType};

/// Rule code for complexity.
pub const CODE: &str = "QG001";

/// Rule name for complexity.
pub const NAME: &str = "complexity";

/// Limits complexity and size of functions and files.
#[derive(Debug, Clone, Default)]
pub struct ComplexityLimits;

impl ComplexityLimits {
    /// Creates a new rule.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Rule for ComplexityLimits {
    fn name(&self) -> &'static str {
        NAME
    }

    fn code(&self) -> &'static str {
        CODE
    }

    fn description(&self) -> &'static str {
        "Limits cyclomatic/cognitive complexity, nesting, length and parameters"
    }

    fn family(&self) -> RuleFamily {
        RuleFamily::Complexity
    }

    fn check(&self, ctx: &FileContext, unit: &SourceUnit) -> Vec<Violation> {
        let mut visitor = ComplexityVisitor {
            ctx,
            scope: Vec::new(),
            violations: Vec::new(),
        };

        let lines = metrics::file_length(unit);
        if lines > ctx.thresholds.max_file_lines {
            visitor.violations.push(
                Violation::new(NAME, ViolationType::FileLength, Severity::Warning, ctx.path, 1)
                    .with_measure(lines, ctx.thresholds.max_file_lines)
                    .with_context("<module>"),
            );
        }

        visitor.visit_body(&unit.body);
        visitor.violations
    }
}

struct ComplexityVisitor<'a, 'ast> {
    ctx: &'a FileContext<'a>,
    scope: Vec<&'ast str>,
    violations: Vec<Violation>,
}

impl<'ast> Visit<'ast> for ComplexityVisitor<'_, 'ast> {
    fn visit_node(&mut self, node: &'ast AstNode) {
        match &node.kind {
            NodeKind::FunctionDef(func) => {
                if let Some(measured) = FunctionMetrics::measure(node) {
                    self.check_function(node, &func.name, measured);
                }
                self.scope.push(func.name.as_str());
                self.visit_body(&func.body);
                self.scope.pop();
            }
            NodeKind::ClassDef(class) => {
                self.scope.push(class.name.as_str());
                self.visit_body(&class.body);
                self.scope.pop();
            }
            _ => qgate_core::ast::walk_node(self, node),
        }
    }
}

impl ComplexityVisitor<'_, '_> {
    fn check_function(&mut self, node: &AstNode, name: &str, m: FunctionMetrics) {
        let t = self.ctx.thresholds;
        let qualified = self.qualified(name);
        let violation = |violation_type, severity, value, threshold| {
            Violation::new(NAME, violation_type, severity, self.ctx.path, node.start_line)
                .in_function(name)
                .with_measure(value, threshold)
                .with_context(qualified.clone())
        };

        let mut found = Vec::new();
        if m.complexity > t.warning_complexity {
            let severity = if m.complexity > t.max_complexity {
                Severity::Error
            } else {
                Severity::Warning
            };
            found.push(violation(
                ViolationType::Complexity,
                severity,
                m.complexity,
                t.max_complexity,
            ));
        }
        if m.length > t.max_function_lines {
            found.push(violation(
                ViolationType::Length,
                Severity::Error,
                m.length,
                t.max_function_lines,
            ));
        }
        if m.parameters > t.max_parameters {
            found.push(violation(
                ViolationType::Parameters,
                Severity::Warning,
                m.parameters,
                t.max_parameters,
            ));
        }
        if m.nesting > t.max_nesting_depth {
            found.push(violation(
                ViolationType::Nesting,
                Severity::Error,
                m.nesting,
                t.max_nesting_depth,
            ));
        }
        if m.cognitive > t.max_cognitive_complexity {
            found.push(violation(
                ViolationType::CognitiveComplexity,
                Severity::Error,
                m.cognitive,
                t.max_cognitive_complexity,
            ));
        }
        self.violations.extend(found);
    }

    fn qualified(&self, name: &str) -> String {
        let mut parts: Vec<&str> = self.scope.clone();
        parts.push(name);
        parts.join(".")
    }
}
