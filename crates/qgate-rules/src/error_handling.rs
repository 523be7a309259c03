//! Rule to detect exception-handling anti-patterns.
//!
//! # Rationale
//!
//! "Let it crash": core logic should let errors propagate to a boundary that
//! can respond to them. Handlers that catch everything, do nothing, or stack
//! fallback upon fallback hide bugs.
//!
//! # Detected Patterns
//!
//! - `except:` without a type (error)
//! - Handlers whose body is only `pass` or a string literal (error)
//! - `except Exception` / `except BaseException` without any `raise`, in core files (warning)
//! - `try` statements nested deeper than `max_nested_try` (warning)

use qgate_core::ast::{walk_node, AstNode, ExceptHandler, Literal, NodeKind, Visit, Walk};
use qgate_core::{
    ContextTag, FileContext, Rule, RuleFamily, Severity, SourceUnit, Violation, ViolationType,
};

/// Rule code for error-handling.
pub const CODE: &str = "QG004";

/// Rule name for error-handling.
pub const NAME: &str = "error-handling";

const BROAD_EXCEPTIONS: &[&str] = &["Exception", "BaseException"];

/// Detects bare, silent, swallowing and deeply nested exception handlers.
#[derive(Debug, Clone, Default)]
pub struct ErrorHandling;

impl ErrorHandling {
    /// Creates a new rule.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Rule for ErrorHandling {
    fn name(&self) -> &'static str {
        NAME
    }

    fn code(&self) -> &'static str {
        CODE
    }

    fn description(&self) -> &'static str {
        "Detects bare except, silent handlers, swallowed exceptions and nested try"
    }

    fn family(&self) -> RuleFamily {
        RuleFamily::ErrorHandling
    }

    fn check(&self, ctx: &FileContext, unit: &SourceUnit) -> Vec<Violation> {
        let mut visitor = ErrorHandlingVisitor {
            ctx,
            is_core: ctx.context(RuleFamily::ErrorHandling) == ContextTag::Core,
            try_depth: 0,
            function: None,
            violations: Vec::new(),
        };
        visitor.visit_body(&unit.body);
        visitor.violations
    }
}

struct ErrorHandlingVisitor<'a, 'ast> {
    ctx: &'a FileContext<'a>,
    is_core: bool,
    try_depth: usize,
    function: Option<&'ast str>,
    violations: Vec<Violation>,
}

impl<'ast> Visit<'ast> for ErrorHandlingVisitor<'_, 'ast> {
    fn visit_node(&mut self, node: &'ast AstNode) {
        match &node.kind {
            NodeKind::FunctionDef(func) => {
                let outer = self.function.replace(func.name.as_str());
                self.visit_body(&func.body);
                self.function = outer;
            }
            NodeKind::Try(block) => {
                self.try_depth += 1;
                for handler in &block.handlers {
                    if let NodeKind::ExceptHandler(h) = &handler.kind {
                        self.check_handler(handler, h);
                    }
                }

                let max = self.ctx.thresholds.max_nested_try;
                if self.try_depth > max {
                    let v = self
                        .violation(ViolationType::NestedTryExcept, Severity::Warning, node.start_line)
                        .with_measure(self.try_depth, max)
                        .with_message(format!(
                            "Nested try/except depth {} exceeds max {max}. Simplify error handling.",
                            self.try_depth
                        ));
                    self.violations.push(v);
                }

                walk_node(self, node);
                self.try_depth -= 1;
            }
            _ => walk_node(self, node),
        }
    }
}

impl ErrorHandlingVisitor<'_, '_> {
    fn violation(&self, violation_type: ViolationType, severity: Severity, line: usize) -> Violation {
        let v = Violation::new(NAME, violation_type, severity, self.ctx.path, line);
        match self.function {
            Some(name) => v.in_function(name).with_context(name),
            None => v,
        }
    }

    fn check_handler(&mut self, node: &AstNode, handler: &ExceptHandler) {
        let line = node.start_line;

        let Some(type_expr) = &handler.type_expr else {
            let v = self
                .violation(ViolationType::BareExcept, Severity::Error, line)
                .with_message(
                    "Bare 'except:' catches all exceptions including \
                     KeyboardInterrupt and SystemExit. Use specific exceptions.",
                );
            self.violations.push(v);
            return;
        };

        if is_noop(&handler.body) {
            let v = self
                .violation(ViolationType::ExceptPass, Severity::Error, line)
                .with_message(
                    "Silent exception handling (except: pass) hides bugs. \
                     Either let it crash or handle meaningfully.",
                );
            self.violations.push(v);
            return;
        }

        if self.is_core && is_broad(type_expr) && !reraises(&handler.body) {
            let v = self
                .violation(ViolationType::ExceptionSwallowed, Severity::Warning, line)
                .with_message(
                    "Broad exception caught without re-raise. \
                     In core logic, let errors propagate to boundaries.",
                );
            self.violations.push(v);
        }
    }
}

/// A body consisting of a single `pass` or a single string literal.
fn is_noop(body: &[AstNode]) -> bool {
    matches!(
        body,
        [AstNode {
            kind: NodeKind::Pass | NodeKind::Literal(Literal::Str(_)),
            ..
        }]
    )
}

/// `Exception` / `BaseException`, alone or inside a tuple.
fn is_broad(type_expr: &AstNode) -> bool {
    let is_broad_name = |node: &AstNode| {
        matches!(&node.kind, NodeKind::Name(name) if BROAD_EXCEPTIONS.contains(&name.as_str()))
    };
    match &type_expr.kind {
        NodeKind::Tuple(items) => items.iter().any(is_broad_name),
        _ => is_broad_name(type_expr),
    }
}

fn reraises(body: &[AstNode]) -> bool {
    Walk::over(body).any(|n| matches!(n.kind, NodeKind::Raise(_)))
}
