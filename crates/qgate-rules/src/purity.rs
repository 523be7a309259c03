//! Rule to keep the functional core free of I/O and shared state.
//!
//! # Rationale
//!
//! "Functional core, imperative shell": business logic should take data in and
//! return data out. Files, sockets, databases, processes, printing, global
//! state and `async` belong in the shell (handlers, adapters, CLIs).
//!
//! # Detected Patterns
//!
//! Inside functions:
//! - Calls matching the I/O call table (`open`, `requests.get`, `execute`, `run`, `print`, ...)
//! - Calls rooted at an I/O module (`os.*`, `socket.*`, `redis.*`, ...)
//! - `global` / `nonlocal` declarations
//! - `await`, `async for`, `async with`
//!
//! Anywhere: `async def`.
//!
//! Findings are errors in core files and warnings in shell files.

use qgate_core::ast::{walk_node, AstNode, NodeKind, Visit};
use qgate_core::utils::{last_segment, root_segment};
use qgate_core::{
    ContextTag, FileContext, Rule, RuleFamily, Severity, SourceUnit, Violation, ViolationType,
};

/// Rule code for purity.
pub const CODE: &str = "QG003";

/// Rule name for purity.
pub const NAME: &str = "purity";

/// Call names per category, checked in order.
///
/// A pattern matches when it equals the callee's last segment or occurs
/// anywhere in the full dotted callee.
const CALL_PATTERNS: &[(ViolationType, &[&str])] = &[
    (
        ViolationType::FileIo,
        &[
            "open",
            "read_text",
            "write_text",
            "read_bytes",
            "write_bytes",
            "mkdir",
            "rmdir",
            "unlink",
            "rename",
            "shutil.copy",
            "shutil.move",
        ],
    ),
    (
        ViolationType::Network,
        &[
            "requests.get",
            "requests.post",
            "requests.put",
            "requests.delete",
            "requests.patch",
            "httpx.get",
            "httpx.post",
            "http.request",
            "urllib.request",
            "urlopen",
            "socket.connect",
            "socket.send",
            "socket.recv",
        ],
    ),
    (
        ViolationType::Database,
        &[
            "execute", "query", "cursor", "commit", "rollback", "add", "delete", "flush", "merge",
            "refresh",
        ],
    ),
    (
        ViolationType::Subprocess,
        &[
            "run",
            "call",
            "check_output",
            "check_call",
            "Popen",
            "system",
            "spawn",
        ],
    ),
    (
        ViolationType::SideEffects,
        &[
            "print", "pprint", "logging", "logger", "log", "debug", "info", "warning", "error",
            "critical",
        ],
    ),
];

/// Root modules per category, consulted when no call pattern matched.
const MODULE_PATTERNS: &[(ViolationType, &[&str])] = &[
    (
        ViolationType::FileIo,
        &["os", "shutil", "pathlib", "io", "tempfile"],
    ),
    (
        ViolationType::Network,
        &["requests", "httpx", "aiohttp", "urllib", "socket", "http"],
    ),
    (
        ViolationType::Database,
        &["sqlite3", "psycopg2", "mysql", "pymongo", "redis", "sqlalchemy"],
    ),
    (ViolationType::Subprocess, &["subprocess", "os"]),
];

/// Flags I/O, shared state and async in functional-core code.
#[derive(Debug, Clone, Default)]
pub struct FunctionalPurity;

impl FunctionalPurity {
    /// Creates a new rule.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Rule for FunctionalPurity {
    fn name(&self) -> &'static str {
        NAME
    }

    fn code(&self) -> &'static str {
        CODE
    }

    fn description(&self) -> &'static str {
        "Keeps I/O, global state and async out of functional-core code"
    }

    fn family(&self) -> RuleFamily {
        RuleFamily::Purity
    }

    fn check(&self, ctx: &FileContext, unit: &SourceUnit) -> Vec<Violation> {
        let severity = match ctx.context(RuleFamily::Purity) {
            ContextTag::Core => Severity::Error,
            ContextTag::Shell => Severity::Warning,
        };
        let mut visitor = PurityVisitor {
            ctx,
            severity,
            function: None,
            violations: Vec::new(),
        };
        visitor.visit_body(&unit.body);
        visitor.violations
    }
}

/// Classifies a dotted callee, call table first, then module table.
#[must_use]
pub fn classify_call(callee: &str) -> Option<ViolationType> {
    let base = last_segment(callee);
    let by_call = CALL_PATTERNS.iter().find_map(|(category, patterns)| {
        patterns
            .iter()
            .any(|p| base == *p || callee.contains(p))
            .then_some(*category)
    });
    by_call.or_else(|| {
        let module = root_segment(callee);
        MODULE_PATTERNS
            .iter()
            .find(|(_, modules)| modules.contains(&module))
            .map(|(category, _)| *category)
    })
}

struct PurityVisitor<'a, 'ast> {
    ctx: &'a FileContext<'a>,
    severity: Severity,
    function: Option<&'ast str>,
    violations: Vec<Violation>,
}

impl<'ast> Visit<'ast> for PurityVisitor<'_, 'ast> {
    fn visit_node(&mut self, node: &'ast AstNode) {
        match &node.kind {
            NodeKind::FunctionDef(func) => {
                if func.is_async {
                    let v = self
                        .violation(ViolationType::AsyncIo, node.start_line)
                        .in_function(&func.name)
                        .with_context(&func.name)
                        .with_message(format!("async def {}", func.name));
                    self.violations.push(v);
                }
                let outer = self.function.replace(func.name.as_str());
                self.visit_body(&func.body);
                self.function = outer;
            }
            NodeKind::Call(call) if self.function.is_some() => {
                if let Some(category) = classify_call(&call.callee) {
                    let v = self
                        .violation(category, node.start_line)
                        .with_message(call.callee.clone());
                    self.violations.push(v);
                }
                walk_node(self, node);
            }
            NodeKind::Global(names) | NodeKind::Nonlocal(names) if self.function.is_some() => {
                let (violation_type, keyword) = if matches!(node.kind, NodeKind::Global(_)) {
                    (ViolationType::GlobalState, "global")
                } else {
                    (ViolationType::NonlocalState, "nonlocal")
                };
                let v = self
                    .violation(violation_type, node.start_line)
                    .with_message(format!("{keyword} {}", names.join(", ")));
                self.violations.push(v);
            }
            NodeKind::Await(inner) if self.function.is_some() => {
                let v = self
                    .violation(ViolationType::AsyncIo, node.start_line)
                    .with_message(format!("await {}", expr_name(inner)));
                self.violations.push(v);
                walk_node(self, node);
            }
            NodeKind::AsyncFor(_) | NodeKind::AsyncWith(_) if self.function.is_some() => {
                let keyword = if matches!(node.kind, NodeKind::AsyncFor(_)) {
                    "async for"
                } else {
                    "async with"
                };
                let v = self
                    .violation(ViolationType::AsyncIo, node.start_line)
                    .with_message(keyword);
                self.violations.push(v);
                walk_node(self, node);
            }
            _ => walk_node(self, node),
        }
    }
}

impl PurityVisitor<'_, '_> {
    fn violation(&self, violation_type: ViolationType, line: usize) -> Violation {
        let function = self.function.unwrap_or("<module>");
        Violation::new(NAME, violation_type, self.severity, self.ctx.path, line)
            .in_function(function)
            .with_context(function)
    }
}

fn expr_name(node: &AstNode) -> &str {
    match &node.kind {
        NodeKind::Call(call) => &call.callee,
        NodeKind::Name(name) => name,
        _ => "<expression>",
    }
}
