//! Rule to check the five SOLID design principles.
//!
//! # Rationale
//!
//! Structural smells such as god classes, type-switch cascades and hidden
//! dependencies make code rigid. Each check is a cheap syntactic heuristic
//! for one principle.
//!
//! # Detected Patterns
//!
//! - **SRP**: files longer than `max_file_lines`, classes with more than
//!   `max_class_public_methods` public methods
//! - **OCP**: functions with more than `max_isinstance_chain` `if isinstance(...)` tests
//! - **LSP**: methods that `raise NotImplementedError`
//! - **ISP**: `Protocol`/`ABC` classes with more than `max_interface_methods` public methods
//! - **DIP**: core code instantiating `*Service`, `*Client`, `*Repository`, ...

use qgate_core::ast::{walk_node, AstNode, ClassDef, FunctionDef, NodeKind, Raise, Visit, Walk};
use qgate_core::utils::{is_public, last_segment};
use qgate_core::{
    ContextTag, FileContext, Rule, RuleFamily, Severity, SourceUnit, Violation, ViolationType,
};

/// Rule code for design-principles.
pub const CODE: &str = "QG002";

/// Rule name for design-principles.
pub const NAME: &str = "design-principles";

/// Name suffixes that mark infrastructure classes.
const SERVICE_SUFFIXES: &[&str] = &[
    "Connection",
    "Service",
    "Client",
    "Repository",
    "Database",
    "Cache",
    "Logger",
    "Queue",
    "Session",
];

/// Base classes that mark an interface.
const INTERFACE_BASES: &[&str] = &["Protocol", "ABC"];

/// Checks SRP, OCP, LSP, ISP and DIP heuristics.
#[derive(Debug, Clone, Default)]
pub struct DesignPrinciples;

impl DesignPrinciples {
    /// Creates a new rule.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Rule for DesignPrinciples {
    fn name(&self) -> &'static str {
        NAME
    }

    fn code(&self) -> &'static str {
        CODE
    }

    fn description(&self) -> &'static str {
        "Checks SOLID heuristics (god classes, isinstance cascades, fat interfaces, ...)"
    }

    fn family(&self) -> RuleFamily {
        RuleFamily::Design
    }

    fn check(&self, ctx: &FileContext, unit: &SourceUnit) -> Vec<Violation> {
        let mut visitor = DesignVisitor {
            ctx,
            is_core: ctx.context(RuleFamily::Design) == ContextTag::Core,
            enclosing: Vec::new(),
            found: Findings::default(),
        };

        let t = ctx.thresholds;
        if unit.line_count > t.max_file_lines {
            visitor.found.srp_file.push(
                Violation::new(NAME, ViolationType::SrpFileLength, Severity::Warning, ctx.path, 1)
                    .with_measure(unit.line_count, t.max_file_lines)
                    .with_message(format!(
                        "File has {} lines (max: {})",
                        unit.line_count, t.max_file_lines
                    )),
            );
        }

        visitor.visit_body(&unit.body);
        visitor.found.into_ordered()
    }
}

/// Per-principle buckets, reported SRP first and DIP last.
#[derive(Default)]
struct Findings {
    srp_file: Vec<Violation>,
    srp_class: Vec<Violation>,
    ocp: Vec<Violation>,
    lsp: Vec<Violation>,
    isp: Vec<Violation>,
    dip: Vec<Violation>,
}

impl Findings {
    fn into_ordered(self) -> Vec<Violation> {
        [
            self.srp_file,
            self.srp_class,
            self.ocp,
            self.lsp,
            self.isp,
            self.dip,
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

enum Enclosing<'ast> {
    Class(&'ast str),
    Function,
}

struct DesignVisitor<'a, 'ast> {
    ctx: &'a FileContext<'a>,
    is_core: bool,
    enclosing: Vec<Enclosing<'ast>>,
    found: Findings,
}

impl<'ast> Visit<'ast> for DesignVisitor<'_, 'ast> {
    fn visit_node(&mut self, node: &'ast AstNode) {
        match &node.kind {
            NodeKind::ClassDef(class) => {
                self.check_class(node, class);
                self.enclosing.push(Enclosing::Class(class.name.as_str()));
                self.visit_body(&class.body);
                self.enclosing.pop();
            }
            NodeKind::FunctionDef(func) => {
                self.check_function(node, func);
                self.enclosing.push(Enclosing::Function);
                self.visit_body(&func.body);
                self.enclosing.pop();
            }
            _ => walk_node(self, node),
        }
    }
}

impl DesignVisitor<'_, '_> {
    fn violation(&self, violation_type: ViolationType, severity: Severity, line: usize) -> Violation {
        Violation::new(NAME, violation_type, severity, self.ctx.path, line)
    }

    fn check_class(&mut self, node: &AstNode, class: &ClassDef) {
        let t = self.ctx.thresholds;
        let public = public_methods(class);

        if public > t.max_class_public_methods {
            let v = self
                .violation(ViolationType::SrpClassMethods, Severity::Warning, node.start_line)
                .with_measure(public, t.max_class_public_methods)
                .with_context(class.name.clone())
                .with_message(format!(
                    "Class '{}' has {public} public methods (max: {})",
                    class.name, t.max_class_public_methods
                ));
            self.found.srp_class.push(v);
        }

        let is_interface = class
            .bases
            .iter()
            .any(|base| INTERFACE_BASES.contains(&last_segment(base)));
        if is_interface && public > t.max_interface_methods {
            let v = self
                .violation(ViolationType::IspFatInterface, Severity::Warning, node.start_line)
                .with_measure(public, t.max_interface_methods)
                .with_context(class.name.clone())
                .with_message(format!(
                    "Interface '{}' has {public} methods (max: {}). \
                     Consider splitting into smaller interfaces.",
                    class.name, t.max_interface_methods
                ));
            self.found.isp.push(v);
        }
    }

    fn check_function(&mut self, node: &AstNode, func: &FunctionDef) {
        let t = self.ctx.thresholds;

        let isinstance_checks = Walk::scope(&func.body)
            .filter(|n| match &n.kind {
                NodeKind::If(branch) => tests_isinstance(&branch.test),
                _ => false,
            })
            .count();
        if isinstance_checks > t.max_isinstance_chain {
            let v = self
                .violation(ViolationType::OcpIsinstanceCascade, Severity::Warning, node.start_line)
                .in_function(&func.name)
                .with_measure(isinstance_checks, t.max_isinstance_chain)
                .with_context(func.name.clone())
                .with_message(format!(
                    "Function '{}' has {isinstance_checks} isinstance checks. \
                     Consider using polymorphism or strategy pattern.",
                    func.name
                ));
            self.found.ocp.push(v);
        }

        if let Some(Enclosing::Class(class)) = self.enclosing.last() {
            let class = *class;
            for raise in Walk::scope(&func.body) {
                if let NodeKind::Raise(r) = &raise.kind {
                    if raises_not_implemented(r) {
                        let v = self
                            .violation(ViolationType::LspNotImplemented, Severity::Error, raise.start_line)
                            .in_function(&func.name)
                            .with_context(format!("{class}.{}", func.name))
                            .with_message(format!(
                                "Method '{}' in class '{class}' raises NotImplementedError, violating LSP.",
                                func.name
                            ));
                        self.found.lsp.push(v);
                    }
                }
            }
        }

        if self.is_core {
            for call in Walk::scope(&func.body) {
                let NodeKind::Call(c) = &call.kind else {
                    continue;
                };
                let class_name = last_segment(&c.callee);
                if SERVICE_SUFFIXES.iter().any(|s| class_name.ends_with(s)) {
                    let v = self
                        .violation(ViolationType::DipDirectInstantiation, Severity::Warning, call.start_line)
                        .in_function(&func.name)
                        .with_context(func.name.clone())
                        .with_message(format!(
                            "Direct instantiation of '{class_name}' in function '{}'. \
                             Consider dependency injection.",
                            func.name
                        ));
                    self.found.dip.push(v);
                }
            }
        }
    }
}

/// Direct methods of a class whose names do not start with `_`.
fn public_methods(class: &ClassDef) -> usize {
    class
        .body
        .iter()
        .filter_map(AstNode::as_function)
        .filter(|f| is_public(&f.name))
        .count()
}

/// `isinstance(...)` alone or as an operand of `and`/`or`.
fn tests_isinstance(test: &AstNode) -> bool {
    match &test.kind {
        NodeKind::Call(call) => matches!(&call.func.kind, NodeKind::Name(n) if n == "isinstance"),
        NodeKind::BoolOp(op) => op.values.iter().any(tests_isinstance),
        _ => false,
    }
}

fn raises_not_implemented(raise: &Raise) -> bool {
    let Some(exc) = &raise.exc else {
        return false;
    };
    match &exc.kind {
        NodeKind::Name(name) => name == "NotImplementedError",
        NodeKind::Call(call) => {
            matches!(&call.func.kind, NodeKind::Name(n) if n == "NotImplementedError")
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{check_at, types};
    use qgate_core::Thresholds;

    fn check_code(code: &str) -> Vec<Violation> {
        check_at(&DesignPrinciples::new(), "pkg/domain/model.py", code, &Thresholds::default())
    }

    #[test]
    fn test_clean_class_passes() {
        let src = "\
class Point:
    def __init__(self, x):
        self.x = x

    def norm(self):
        return abs(self.x)
";
        assert!(check_code(src).is_empty());
    }

    #[test]
    fn test_srp_class_methods() {
        let mut src = String::from("class God:\n    def _private(self):\n        pass\n");
        for i in 0..6 {
            src.push_str(&format!("    def m{i}(self):\n        pass\n"));
        }
        let violations = check_code(&src);
        assert_eq!(types(&violations), vec!["srp_class_methods"]);
        assert_eq!(violations[0].value, Some(6));
        assert_eq!(violations[0].context, "God");
        assert_eq!(
            violations[0].message.as_deref(),
            Some("Class 'God' has 6 public methods (max: 5)")
        );
    }

    #[test]
    fn test_srp_file_length_comes_first() {
        let thresholds = Thresholds {
            max_file_lines: 3,
            max_class_public_methods: 0,
            ..Thresholds::default()
        };
        let src = "class A:\n    def run(self):\n        pass\n";
        let violations = check_at(&DesignPrinciples::new(), "pkg/domain/a.py", src, &thresholds);
        assert_eq!(types(&violations), vec!["srp_file_length", "srp_class_methods"]);
        assert_eq!(violations[0].line, 1);
        assert_eq!(violations[0].message.as_deref(), Some("File has 4 lines (max: 3)"));
    }

    #[test]
    fn test_ocp_isinstance_cascade() {
        let src = "\
def area(shape):
    if isinstance(shape, Circle):
        return 1
    elif isinstance(shape, Square) or shape is None:
        return 2
    elif isinstance(shape, Triangle):
        return 3
    return 0
";
        let violations = check_code(src);
        assert_eq!(types(&violations), vec!["ocp_isinstance_cascade"]);
        assert_eq!(violations[0].value, Some(3));
        assert_eq!(violations[0].severity, Severity::Warning);
    }

    #[test]
    fn test_ocp_at_threshold_passes() {
        let src = "\
def f(x):
    if isinstance(x, int):
        return 1
    if isinstance(x, str):
        return 2
    if x:
        return 3
";
        assert!(check_code(src).is_empty());
    }

    #[test]
    fn test_lsp_not_implemented_in_method() {
        let src = "\
class Base:
    def run(self):
        raise NotImplementedError

    def stop(self):
        raise NotImplementedError('subclass')

def helper():
    raise NotImplementedError
";
        let violations = check_code(src);
        assert_eq!(types(&violations), vec!["lsp_not_implemented", "lsp_not_implemented"]);
        assert_eq!(violations[0].line, 3);
        assert_eq!(violations[0].context, "Base.run");
        assert_eq!(violations[0].severity, Severity::Error);
        assert_eq!(violations[1].context, "Base.stop");
    }

    #[test]
    fn test_isp_fat_protocol() {
        let mut src = String::from("class Store(typing.Protocol):\n");
        for i in 0..8 {
            src.push_str(&format!("    def op{i}(self): ...\n"));
        }
        let violations = check_code(&src);
        assert_eq!(types(&violations), vec!["srp_class_methods", "isp_fat_interface"]);
        assert_eq!(violations[1].value, Some(8));
        assert_eq!(violations[1].threshold, Some(7));
    }

    #[test]
    fn test_dip_only_in_core() {
        let src = "\
def handle(order):
    client = HttpClient()
    repo = db.OrderRepository(client)
    return repo.save(order)
";
        let violations = check_code(src);
        assert_eq!(
            types(&violations),
            vec!["dip_direct_instantiation", "dip_direct_instantiation"]
        );
        assert_eq!(violations[1].line, 3);
        assert_eq!(violations[1].context, "handle");

        let shell = check_at(
            &DesignPrinciples::new(),
            "app/handlers/orders.py",
            src,
            &Thresholds::default(),
        );
        assert!(shell.is_empty());
    }

    #[test]
    fn test_groups_are_ordered_by_principle() {
        let src = "\
def make():
    return CacheService()

class Base:
    def run(self):
        raise NotImplementedError
";
        let violations = check_code(src);
        assert_eq!(
            types(&violations),
            vec!["lsp_not_implemented", "dip_direct_instantiation"]
        );
    }
}
