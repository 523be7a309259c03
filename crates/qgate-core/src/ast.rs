//! Language-neutral syntax tree consumed by every rule.
//!
//! Front ends (see [`crate::SourceParser`]) lower their concrete syntax into
//! this model. Each node exclusively owns its children, so a tree never shares
//! nodes and never contains cycles. Analyzers match on [`NodeKind`]
//! exhaustively instead of dispatching on runtime types.

use std::path::{Path, PathBuf};

/// A node of the generic syntax tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AstNode {
    /// What this node is, with its kind-specific payload.
    pub kind: NodeKind,
    /// First line of the node (1-indexed).
    pub start_line: usize,
    /// Last line of the node (1-indexed, inclusive).
    pub end_line: usize,
}

/// Tagged node variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// `def name(params): body`, sync or async.
    FunctionDef(FunctionDef),
    /// `class Name(bases): body`.
    ClassDef(ClassDef),
    /// `if` statement (or an `elif` clause nested in a parent's `orelse`).
    If(If),
    /// `for` loop.
    For(Loop),
    /// `while` loop. The condition is the only header node.
    While(Loop),
    /// `async for` loop.
    AsyncFor(Loop),
    /// `try` statement.
    Try(Try),
    /// One `except` clause of a [`Try`].
    ExceptHandler(ExceptHandler),
    /// `with` statement.
    With(With),
    /// `async with` statement.
    AsyncWith(With),
    /// Chain of `and` / `or` with the same operator.
    BoolOp(BoolOp),
    /// List/set/dict comprehension or generator expression.
    Comprehension(Comprehension),
    /// Function or constructor call.
    Call(Call),
    /// `raise` statement.
    Raise(Raise),
    /// `global a, b`.
    Global(Vec<String>),
    /// `nonlocal a, b`.
    Nonlocal(Vec<String>),
    /// `await value`.
    Await(Box<AstNode>),
    /// `import a.b` / `from a import b`; holds the imported module names.
    Import(Vec<String>),
    /// Constant value.
    Literal(Literal),
    /// Identifier or dotted attribute chain made only of identifiers.
    Name(String),
    /// Tuple display, e.g. the type list of `except (A, B):`.
    Tuple(Vec<AstNode>),
    /// Empty statement (`pass`).
    Pass,
    /// Anything else; only its children matter to the analyzers.
    Other(Vec<AstNode>),
}

/// Function definition payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionDef {
    /// Function name.
    pub name: String,
    /// Parameters in declaration order.
    pub params: Vec<Param>,
    /// Statements of the function body.
    pub body: Vec<AstNode>,
    /// Whether the function was declared `async`.
    pub is_async: bool,
}

/// A single declared parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    /// Parameter name without `*` / `**` prefix.
    pub name: String,
    /// Positional/keyword, `*args` or `**kwargs`.
    pub kind: ParamKind,
}

/// Kind of a declared parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// Ordinary named parameter (positional, keyword-only or positional-only).
    Positional,
    /// Variadic positional parameter (`*args`).
    VarPositional,
    /// Variadic keyword parameter (`**kwargs`).
    VarKeyword,
}

/// Class definition payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassDef {
    /// Class name.
    pub name: String,
    /// Dotted names of the base classes (`abc.ABC`, `Protocol`, ...).
    pub bases: Vec<String>,
    /// Statements of the class body.
    pub body: Vec<AstNode>,
}

/// `if` payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct If {
    /// Condition expression.
    pub test: Box<AstNode>,
    /// Statements executed when the condition holds.
    pub body: Vec<AstNode>,
    /// `elif` clauses (as `If` nodes with `is_elif` set) and/or `else` statements.
    pub orelse: Vec<AstNode>,
    /// Set when this node is an `elif` clause of the enclosing `If`.
    pub is_elif: bool,
}

/// Loop payload shared by `for`, `async for` and `while`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Loop {
    /// Loop target and iterable, or the `while` condition.
    pub header: Vec<AstNode>,
    /// Loop body.
    pub body: Vec<AstNode>,
    /// `else:` block of the loop.
    pub orelse: Vec<AstNode>,
}

/// `try` payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Try {
    /// Protected block.
    pub body: Vec<AstNode>,
    /// [`NodeKind::ExceptHandler`] nodes in source order.
    pub handlers: Vec<AstNode>,
    /// `else:` block.
    pub orelse: Vec<AstNode>,
    /// `finally:` block.
    pub finalbody: Vec<AstNode>,
}

/// `except` clause payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExceptHandler {
    /// Caught type expression; `None` for a bare `except:`.
    pub type_expr: Option<Box<AstNode>>,
    /// Name bound with `as`.
    pub name: Option<String>,
    /// Handler body.
    pub body: Vec<AstNode>,
}

/// `with` payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct With {
    /// Context manager expressions.
    pub items: Vec<AstNode>,
    /// Managed block.
    pub body: Vec<AstNode>,
}

/// Boolean operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolOperator {
    /// `and`
    And,
    /// `or`
    Or,
}

/// Boolean operation payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoolOp {
    /// Operator shared by every operand.
    pub op: BoolOperator,
    /// Operands, at least two.
    pub values: Vec<AstNode>,
}

/// Comprehension payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comprehension {
    /// Produced element(s): the value, or key and value for dict comprehensions.
    pub element: Vec<AstNode>,
    /// `for ... in ...` clauses in order.
    pub generators: Vec<Generator>,
}

/// One `for ... in ... [if ...]*` clause of a comprehension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generator {
    /// Target and iterable expressions.
    pub header: Vec<AstNode>,
    /// Filter conditions attached to this clause.
    pub ifs: Vec<AstNode>,
}

/// Call payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    /// Dotted name of the callee (`requests.get`, `open`), or the trailing
    /// attribute chain when the receiver is not a plain name
    /// (`Session().get` resolves to `get`). Empty when nothing resolves.
    pub callee: String,
    /// Callee expression.
    pub func: Box<AstNode>,
    /// Positional and keyword argument values.
    pub args: Vec<AstNode>,
}

/// `raise` payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raise {
    /// Raised expression; `None` for a bare re-raise.
    pub exc: Option<Box<AstNode>>,
    /// `from` clause.
    pub cause: Option<Box<AstNode>>,
}

/// Constant value kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Literal {
    /// String literal with its unquoted text.
    Str(String),
    /// Bytes literal with its unquoted text.
    Bytes(String),
    /// Integer, float or complex literal.
    Number(String),
    /// `True` / `False`.
    Bool(bool),
    /// `None`.
    None,
    /// `...`
    Ellipsis,
}

impl AstNode {
    /// Creates a node spanning the given lines.
    #[must_use]
    pub fn new(kind: NodeKind, start_line: usize, end_line: usize) -> Self {
        Self {
            kind,
            start_line,
            end_line,
        }
    }

    /// Returns the direct children in source order.
    #[must_use]
    pub fn children(&self) -> Vec<&AstNode> {
        let mut out: Vec<&AstNode> = Vec::new();
        match &self.kind {
            NodeKind::FunctionDef(f) => out.extend(&f.body),
            NodeKind::ClassDef(c) => out.extend(&c.body),
            NodeKind::If(i) => {
                out.push(&i.test);
                out.extend(&i.body);
                out.extend(&i.orelse);
            }
            NodeKind::For(l) | NodeKind::While(l) | NodeKind::AsyncFor(l) => {
                out.extend(&l.header);
                out.extend(&l.body);
                out.extend(&l.orelse);
            }
            NodeKind::Try(t) => {
                out.extend(&t.body);
                out.extend(&t.handlers);
                out.extend(&t.orelse);
                out.extend(&t.finalbody);
            }
            NodeKind::ExceptHandler(h) => {
                if let Some(ty) = &h.type_expr {
                    out.push(ty);
                }
                out.extend(&h.body);
            }
            NodeKind::With(w) | NodeKind::AsyncWith(w) => {
                out.extend(&w.items);
                out.extend(&w.body);
            }
            NodeKind::BoolOp(b) => out.extend(&b.values),
            NodeKind::Comprehension(c) => {
                out.extend(&c.element);
                for generator in &c.generators {
                    out.extend(&generator.header);
                    out.extend(&generator.ifs);
                }
            }
            NodeKind::Call(c) => {
                out.push(&c.func);
                out.extend(&c.args);
            }
            NodeKind::Raise(r) => {
                if let Some(exc) = &r.exc {
                    out.push(exc);
                }
                if let Some(cause) = &r.cause {
                    out.push(cause);
                }
            }
            NodeKind::Await(value) => out.push(value),
            NodeKind::Tuple(items) | NodeKind::Other(items) => out.extend(items),
            NodeKind::Global(_)
            | NodeKind::Nonlocal(_)
            | NodeKind::Import(_)
            | NodeKind::Literal(_)
            | NodeKind::Name(_)
            | NodeKind::Pass => {}
        }
        out
    }

    /// Iterates over this node and all descendants in depth-first pre-order.
    #[must_use]
    pub fn walk(&self) -> Walk<'_> {
        Walk {
            stack: vec![self],
            enter_definitions: true,
        }
    }

    /// Returns the function payload if this is a function definition.
    #[must_use]
    pub fn as_function(&self) -> Option<&FunctionDef> {
        match &self.kind {
            NodeKind::FunctionDef(f) => Some(f),
            _ => None,
        }
    }

    /// Returns the class payload if this is a class definition.
    #[must_use]
    pub fn as_class(&self) -> Option<&ClassDef> {
        match &self.kind {
            NodeKind::ClassDef(c) => Some(c),
            _ => None,
        }
    }

    /// Whether this node opens a new nesting level for depth metrics.
    #[must_use]
    pub fn is_control_structure(&self) -> bool {
        matches!(
            self.kind,
            NodeKind::If(_)
                | NodeKind::For(_)
                | NodeKind::While(_)
                | NodeKind::With(_)
                | NodeKind::Try(_)
        )
    }

    /// Whether this node starts a new definition scope.
    #[must_use]
    pub fn is_definition(&self) -> bool {
        matches!(self.kind, NodeKind::FunctionDef(_) | NodeKind::ClassDef(_))
    }
}

/// Depth-first pre-order iterator returned by [`AstNode::walk`].
///
/// Uses an explicit stack so arbitrarily deep trees cannot overflow the call stack.
pub struct Walk<'a> {
    stack: Vec<&'a AstNode>,
    enter_definitions: bool,
}

impl<'a> Walk<'a> {
    /// Walks a sequence of sibling nodes (e.g. a block body) in order.
    #[must_use]
    pub fn over(nodes: &'a [AstNode]) -> Self {
        Self {
            stack: nodes.iter().rev().collect(),
            enter_definitions: true,
        }
    }

    /// Walks one scope: like [`Walk::over`], but nested function and class
    /// definitions are skipped entirely.
    #[must_use]
    pub fn scope(nodes: &'a [AstNode]) -> Self {
        Self {
            stack: nodes.iter().rev().collect(),
            enter_definitions: false,
        }
    }
}

impl<'a> Iterator for Walk<'a> {
    type Item = &'a AstNode;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let node = self.stack.pop()?;
            if !self.enter_definitions && node.is_definition() {
                continue;
            }
            self.stack.extend(node.children().into_iter().rev());
            return Some(node);
        }
    }
}

/// Hook-based traversal in the style of `syn::visit`.
///
/// Override [`Visit::visit_node`], match on the kinds you care about and call
/// [`walk_node`] to continue into the children.
pub trait Visit<'ast> {
    /// Called for every node. The default recurses into the children.
    fn visit_node(&mut self, node: &'ast AstNode) {
        walk_node(self, node);
    }

    /// Visits a sequence of statements in order.
    fn visit_body(&mut self, nodes: &'ast [AstNode]) {
        for node in nodes {
            self.visit_node(node);
        }
    }
}

/// Visits each direct child of `node`.
pub fn walk_node<'ast, V: Visit<'ast> + ?Sized>(visitor: &mut V, node: &'ast AstNode) {
    for child in node.children() {
        visitor.visit_node(child);
    }
}

/// One analyzed file: its path, size and module-level statements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUnit {
    /// Path of the file as selected for analysis.
    pub path: PathBuf,
    /// Newline-delimited line count of the file.
    pub line_count: usize,
    /// Module-level statements.
    pub body: Vec<AstNode>,
}

impl SourceUnit {
    /// Creates a unit, deriving the line count from the source text.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, source: &str, body: Vec<AstNode>) -> Self {
        Self {
            path: path.into(),
            line_count: count_lines(source),
            body,
        }
    }

    /// Returns the file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Iterates over every node of the file in depth-first pre-order.
    #[must_use]
    pub fn walk(&self) -> Walk<'_> {
        Walk::over(&self.body)
    }
}

/// Counts newline-delimited lines: one more than the number of `\n`.
#[must_use]
pub fn count_lines(source: &str) -> usize {
    source.bytes().filter(|b| *b == b'\n').count() + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(id: &str, line: usize) -> AstNode {
        AstNode::new(NodeKind::Name(id.to_string()), line, line)
    }

    #[test]
    fn walk_visits_in_source_order() {
        let call = AstNode::new(
            NodeKind::Call(Call {
                callee: "f".to_string(),
                func: Box::new(name("f", 2)),
                args: vec![name("x", 2)],
            }),
            2,
            2,
        );
        let branch = AstNode::new(
            NodeKind::If(If {
                test: Box::new(name("cond", 1)),
                body: vec![call],
                orelse: vec![AstNode::new(NodeKind::Pass, 4, 4)],
                is_elif: false,
            }),
            1,
            4,
        );

        let kinds: Vec<&str> = branch
            .walk()
            .map(|n| match &n.kind {
                NodeKind::If(_) => "if",
                NodeKind::Name(id) => id.as_str(),
                NodeKind::Call(_) => "call",
                NodeKind::Pass => "pass",
                _ => "?",
            })
            .collect();

        assert_eq!(kinds, vec!["if", "cond", "call", "f", "x", "pass"]);
    }

    #[test]
    fn scope_walk_skips_nested_definitions() {
        let inner = AstNode::new(
            NodeKind::FunctionDef(FunctionDef {
                name: "inner".to_string(),
                params: vec![],
                body: vec![name("hidden", 3)],
                is_async: false,
            }),
            2,
            3,
        );
        let body = vec![name("a", 1), inner, name("b", 4)];

        let seen: Vec<&str> = Walk::scope(&body)
            .filter_map(|n| match &n.kind {
                NodeKind::Name(id) => Some(id.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(seen, vec!["a", "b"]);
        assert_eq!(Walk::over(&body).count(), 4);
    }

    #[test]
    fn visitor_sees_every_node_once() {
        struct Counter(usize);
        impl<'ast> Visit<'ast> for Counter {
            fn visit_node(&mut self, node: &'ast AstNode) {
                self.0 += 1;
                walk_node(self, node);
            }
        }

        let tuple = AstNode::new(
            NodeKind::Tuple(vec![name("A", 1), name("B", 1)]),
            1,
            1,
        );
        let mut counter = Counter(0);
        counter.visit_body(std::slice::from_ref(&tuple));
        assert_eq!(counter.0, 3);
    }

    #[test]
    fn count_lines_matches_newline_count() {
        assert_eq!(count_lines(""), 1);
        assert_eq!(count_lines("a"), 1);
        assert_eq!(count_lines("a\nb\n"), 3);
    }

    #[test]
    fn control_structures() {
        assert!(!name("x", 1).is_control_structure());
        let with = AstNode::new(
            NodeKind::With(With {
                items: vec![],
                body: vec![],
            }),
            1,
            1,
        );
        assert!(with.is_control_structure());
        let async_with = AstNode::new(
            NodeKind::AsyncWith(With {
                items: vec![],
                body: vec![],
            }),
            1,
            1,
        );
        assert!(!async_with.is_control_structure());
    }
}
