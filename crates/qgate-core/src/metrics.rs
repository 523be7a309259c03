//! Structural metrics over the generic syntax tree.
//!
//! Pure functions with no policy attached; thresholds are applied by the
//! complexity rule. Every metric covers the whole subtree, so the numbers for
//! a function include any functions or classes nested inside it.

use crate::ast::{AstNode, FunctionDef, NodeKind, ParamKind, SourceUnit};

/// Cyclomatic complexity: one plus every decision point in the subtree.
///
/// Decision points are `if`, `for`, `while`, `except` clauses and `with`
/// blocks, `operands - 1` per boolean chain, and `1 + filters` for each
/// comprehension generator.
#[must_use]
pub fn cyclomatic_complexity(node: &AstNode) -> usize {
    1 + node.walk().map(decision_points).sum::<usize>()
}

fn decision_points(node: &AstNode) -> usize {
    match &node.kind {
        NodeKind::If(_)
        | NodeKind::For(_)
        | NodeKind::While(_)
        | NodeKind::ExceptHandler(_)
        | NodeKind::With(_) => 1,
        NodeKind::BoolOp(op) => op.values.len().saturating_sub(1),
        NodeKind::Comprehension(comp) => comp.generators.iter().map(|g| 1 + g.ifs.len()).sum(),
        _ => 0,
    }
}

/// Cognitive complexity: control structures cost more the deeper they sit.
///
/// `if`/`for`/`while`/`try`/`with` add `1 + nesting` and their contents are
/// scored one level deeper. An `elif` adds a flat `+1` on top of its own
/// `if` cost at the parent's level. Each `except` clause adds `+1`.
#[must_use]
pub fn cognitive_complexity(node: &AstNode) -> usize {
    cognitive_at(node, 0)
}

fn cognitive_at(node: &AstNode, nesting: usize) -> usize {
    match &node.kind {
        NodeKind::If(branch) => {
            let mut total = 1 + nesting;
            total += cognitive_at(&branch.test, nesting);
            total += cognitive_all(&branch.body, nesting + 1);
            for child in &branch.orelse {
                total += match &child.kind {
                    NodeKind::If(inner) if inner.is_elif => 1 + cognitive_at(child, nesting),
                    _ => cognitive_at(child, nesting + 1),
                };
            }
            total
        }
        NodeKind::For(_) | NodeKind::While(_) | NodeKind::With(_) => {
            1 + nesting
                + node
                    .children()
                    .into_iter()
                    .map(|child| cognitive_at(child, nesting + 1))
                    .sum::<usize>()
        }
        NodeKind::Try(block) => {
            let mut total = 1 + nesting;
            total += cognitive_all(&block.body, nesting + 1);
            for handler in &block.handlers {
                total += 1 + cognitive_at(handler, nesting + 1);
            }
            total += cognitive_all(&block.orelse, nesting + 1);
            total += cognitive_all(&block.finalbody, nesting + 1);
            total
        }
        _ => node
            .children()
            .into_iter()
            .map(|child| cognitive_at(child, nesting))
            .sum(),
    }
}

fn cognitive_all(nodes: &[AstNode], nesting: usize) -> usize {
    nodes.iter().map(|n| cognitive_at(n, nesting)).sum()
}

/// Maximum depth of nested `if`/`for`/`while`/`with`/`try` blocks.
///
/// A function with no control structures has depth 0. An `elif` counts as
/// nested inside its parent `if`.
#[must_use]
pub fn nesting_depth(node: &AstNode) -> usize {
    depth_below(node, 0)
}

fn depth_below(node: &AstNode, current: usize) -> usize {
    node.children()
        .into_iter()
        .map(|child| {
            if child.is_control_structure() {
                depth_below(child, current + 1)
            } else {
                depth_below(child, current)
            }
        })
        .fold(current, usize::max)
}

/// Inclusive line span of a node; never less than 1.
#[must_use]
pub fn function_length(node: &AstNode) -> usize {
    node.end_line.saturating_sub(node.start_line) + 1
}

/// Named parameters, plus one each for `*args` and `**kwargs`.
#[must_use]
pub fn parameter_count(func: &FunctionDef) -> usize {
    let named = func
        .params
        .iter()
        .filter(|p| p.kind == ParamKind::Positional)
        .count();
    let has = |kind: ParamKind| usize::from(func.params.iter().any(|p| p.kind == kind));
    named + has(ParamKind::VarPositional) + has(ParamKind::VarKeyword)
}

/// Newline-delimited line count of the file.
#[must_use]
pub fn file_length(unit: &SourceUnit) -> usize {
    unit.line_count
}

/// All per-function metrics computed in one place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FunctionMetrics {
    /// Cyclomatic complexity.
    pub complexity: usize,
    /// Cognitive complexity.
    pub cognitive: usize,
    /// Maximum nesting depth.
    pub nesting: usize,
    /// Inclusive line span.
    pub length: usize,
    /// Parameter count.
    pub parameters: usize,
}

impl FunctionMetrics {
    /// Measures a function definition node. Returns `None` for other nodes.
    #[must_use]
    pub fn measure(node: &AstNode) -> Option<Self> {
        let func = node.as_function()?;
        Some(Self {
            complexity: cyclomatic_complexity(node),
            cognitive: cognitive_complexity(node),
            nesting: nesting_depth(node),
            length: function_length(node),
            parameters: parameter_count(func),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{BoolOp, BoolOperator, Comprehension, Generator, If, Loop, Param, Try, With};
    use crate::ast::ExceptHandler;

    fn pass(line: usize) -> AstNode {
        AstNode::new(NodeKind::Pass, line, line)
    }

    fn name(id: &str) -> AstNode {
        AstNode::new(NodeKind::Name(id.to_string()), 1, 1)
    }

    fn if_node(body: Vec<AstNode>, orelse: Vec<AstNode>, is_elif: bool) -> AstNode {
        AstNode::new(
            NodeKind::If(If {
                test: Box::new(name("cond")),
                body,
                orelse,
                is_elif,
            }),
            1,
            1,
        )
    }

    fn for_node(body: Vec<AstNode>) -> AstNode {
        AstNode::new(
            NodeKind::For(Loop {
                header: vec![name("x"), name("items")],
                body,
                orelse: vec![],
            }),
            1,
            1,
        )
    }

    fn func(body: Vec<AstNode>, start: usize, end: usize) -> AstNode {
        AstNode::new(
            NodeKind::FunctionDef(FunctionDef {
                name: "f".to_string(),
                params: vec![],
                body,
                is_async: false,
            }),
            start,
            end,
        )
    }

    fn param(name: &str, kind: ParamKind) -> Param {
        Param {
            name: name.to_string(),
            kind,
        }
    }

    #[test]
    fn empty_function_has_base_metrics() {
        let f = func(vec![pass(2)], 1, 2);
        assert_eq!(cyclomatic_complexity(&f), 1);
        assert_eq!(cognitive_complexity(&f), 0);
        assert_eq!(nesting_depth(&f), 0);
        assert_eq!(function_length(&f), 2);
    }

    #[test]
    fn length_is_never_zero() {
        assert_eq!(function_length(&func(vec![], 5, 5)), 1);
        assert_eq!(function_length(&func(vec![], 5, 3)), 1);
    }

    #[test]
    fn nesting_pyramid_counts_each_level() {
        let innermost = for_node(vec![pass(4)]);
        let middle = if_node(vec![innermost], vec![], false);
        let outer = for_node(vec![middle]);
        let f = func(vec![outer], 1, 4);

        assert_eq!(nesting_depth(&f), 3);
        assert_eq!(cyclomatic_complexity(&f), 4);
        // 1 + 2 + 3
        assert_eq!(cognitive_complexity(&f), 6);
    }

    #[test]
    fn elif_chain_scoring() {
        // if a: pass / elif b: pass / else: pass
        let elif = if_node(vec![pass(3)], vec![pass(5)], true);
        let top = if_node(vec![pass(2)], vec![elif], false);
        let f = func(vec![top], 1, 5);

        assert_eq!(cyclomatic_complexity(&f), 3);
        // if: 1, elif: flat 1 + its own 1 + 0
        assert_eq!(cognitive_complexity(&f), 3);
        assert_eq!(nesting_depth(&f), 2);
    }

    #[test]
    fn try_handlers_add_flat_increment() {
        let handler = AstNode::new(
            NodeKind::ExceptHandler(ExceptHandler {
                type_expr: Some(Box::new(name("ValueError"))),
                name: None,
                body: vec![pass(4)],
            }),
            3,
            4,
        );
        let block = AstNode::new(
            NodeKind::Try(Try {
                body: vec![pass(2)],
                handlers: vec![handler],
                orelse: vec![],
                finalbody: vec![],
            }),
            1,
            4,
        );
        let f = func(vec![block], 1, 4);

        assert_eq!(cyclomatic_complexity(&f), 2);
        assert_eq!(cognitive_complexity(&f), 2);
        assert_eq!(nesting_depth(&f), 1);
    }

    #[test]
    fn bool_ops_and_comprehensions_add_decision_points() {
        let chain = AstNode::new(
            NodeKind::BoolOp(BoolOp {
                op: BoolOperator::And,
                values: vec![name("a"), name("b"), name("c")],
            }),
            2,
            2,
        );
        let comp = AstNode::new(
            NodeKind::Comprehension(Comprehension {
                element: vec![name("x")],
                generators: vec![Generator {
                    header: vec![name("x"), name("xs")],
                    ifs: vec![name("x")],
                }],
            }),
            3,
            3,
        );
        let f = func(vec![chain, comp], 1, 3);

        // 1 + (3 - 1) + (1 + 1)
        assert_eq!(cyclomatic_complexity(&f), 5);
        assert_eq!(cognitive_complexity(&f), 0);
    }

    #[test]
    fn async_with_is_not_a_control_structure() {
        let block = AstNode::new(
            NodeKind::AsyncWith(With {
                items: vec![name("lock")],
                body: vec![pass(2)],
            }),
            1,
            2,
        );
        let f = func(vec![block], 1, 2);
        assert_eq!(cyclomatic_complexity(&f), 1);
        assert_eq!(cognitive_complexity(&f), 0);
        assert_eq!(nesting_depth(&f), 0);
    }

    #[test]
    fn parameter_count_includes_variadics_once() {
        let f = FunctionDef {
            name: "f".to_string(),
            params: vec![
                param("self", ParamKind::Positional),
                param("a", ParamKind::Positional),
                param("args", ParamKind::VarPositional),
                param("kwargs", ParamKind::VarKeyword),
            ],
            body: vec![],
            is_async: false,
        };
        assert_eq!(parameter_count(&f), 4);
    }

    #[test]
    fn measure_ignores_non_functions() {
        assert!(FunctionMetrics::measure(&pass(1)).is_none());
        let m = FunctionMetrics::measure(&func(vec![for_node(vec![])], 1, 3));
        assert_eq!(
            m,
            Some(FunctionMetrics {
                complexity: 2,
                cognitive: 1,
                nesting: 1,
                length: 3,
                parameters: 0,
            })
        );
    }
}
