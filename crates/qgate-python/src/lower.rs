//! Lowering from the tree-sitter Python grammar to the generic syntax tree.

use qgate_core::ast::{
    AstNode, BoolOp, BoolOperator, Call, ClassDef, Comprehension, ExceptHandler, FunctionDef,
    Generator, If, Literal, Loop, NodeKind, Param, ParamKind, Raise, Try, With,
};
use std::cell::Cell;
use tree_sitter::{Node, Point};

/// Deepest syntax tree the lowerer builds. Metrics and rule visitors recurse
/// once per level, so this also bounds their stack use.
pub(crate) const MAX_DEPTH: usize = 200;

/// Converts concrete syntax nodes into [`AstNode`]s.
pub(crate) struct Lowerer<'s> {
    src: &'s [u8],
    depth: Cell<usize>,
    too_deep: Cell<bool>,
}

impl<'s> Lowerer<'s> {
    pub(crate) fn new(src: &'s [u8]) -> Self {
        Self {
            src,
            depth: Cell::new(0),
            too_deep: Cell::new(false),
        }
    }

    /// Whether lowering stopped at [`MAX_DEPTH`]; the tree is then truncated.
    pub(crate) fn too_deep(&self) -> bool {
        self.too_deep.get()
    }

    /// Runs `f` one level deeper, or returns an empty node past the limit.
    fn nested(&self, node: Node<'_>, f: impl FnOnce() -> AstNode) -> AstNode {
        let depth = self.depth.get();
        if depth >= MAX_DEPTH {
            self.too_deep.set(true);
            return empty(node);
        }
        self.depth.set(depth + 1);
        let lowered = f();
        self.depth.set(depth);
        lowered
    }

    fn text(&self, node: Node<'_>) -> &'s str {
        node.utf8_text(self.src).unwrap_or("")
    }

    /// Lowers every statement directly under `node` (a module or block).
    pub(crate) fn block(&self, node: Option<Node<'_>>) -> Vec<AstNode> {
        node.map(|n| self.all(&named_children(n))).unwrap_or_default()
    }

    fn all(&self, nodes: &[Node<'_>]) -> Vec<AstNode> {
        nodes.iter().map(|n| self.lower(*n)).collect()
    }

    fn field(&self, node: Node<'_>, name: &str) -> Option<AstNode> {
        node.child_by_field_name(name).map(|n| self.lower(n))
    }

    pub(crate) fn lower(&self, node: Node<'_>) -> AstNode {
        self.nested(node, || self.lower_node(node))
    }

    fn lower_node(&self, node: Node<'_>) -> AstNode {
        let (start, end) = span(node);
        let kind = match node.kind() {
            "function_definition" => NodeKind::FunctionDef(self.function(node)),
            "decorated_definition" => match node.child_by_field_name("definition") {
                Some(def) => return self.lower(def),
                None => NodeKind::Other(self.all(&named_children(node))),
            },
            "class_definition" => NodeKind::ClassDef(self.class(node)),
            "if_statement" => NodeKind::If(self.if_chain(node, false)),
            "for_statement" => {
                let lp = self.for_loop(node);
                if is_async(node) {
                    NodeKind::AsyncFor(lp)
                } else {
                    NodeKind::For(lp)
                }
            }
            "while_statement" => NodeKind::While(Loop {
                header: self.field(node, "condition").into_iter().collect(),
                body: self.block(node.child_by_field_name("body")),
                orelse: self.else_body(node.child_by_field_name("alternative")),
            }),
            "try_statement" => NodeKind::Try(self.try_block(node)),
            "except_clause" | "except_group_clause" => NodeKind::ExceptHandler(self.handler(node)),
            "with_statement" => {
                let with = self.with_block(node);
                if is_async(node) {
                    NodeKind::AsyncWith(with)
                } else {
                    NodeKind::With(with)
                }
            }
            "boolean_operator" => {
                let op = bool_operator(node);
                NodeKind::BoolOp(BoolOp {
                    op,
                    values: self.bool_operands(node, op),
                })
            }
            "list_comprehension"
            | "set_comprehension"
            | "dictionary_comprehension"
            | "generator_expression" => NodeKind::Comprehension(self.comprehension(node)),
            "call" => NodeKind::Call(self.call(node)),
            "attribute" => match self.dotted(node) {
                Some(name) => NodeKind::Name(name),
                None => NodeKind::Other(self.field(node, "object").into_iter().collect()),
            },
            "identifier" => NodeKind::Name(self.text(node).to_string()),
            "raise_statement" => NodeKind::Raise(self.raise(node)),
            "global_statement" => NodeKind::Global(self.identifiers(node)),
            "nonlocal_statement" => NodeKind::Nonlocal(self.identifiers(node)),
            "await" => match named_children(node).first() {
                Some(value) => NodeKind::Await(Box::new(self.lower(*value))),
                None => NodeKind::Other(Vec::new()),
            },
            "import_statement" | "import_from_statement" => NodeKind::Import(self.imports(node)),
            "pass_statement" => NodeKind::Pass,
            "expression_statement" | "parenthesized_expression" => {
                let children = named_children(node);
                if let [only] = children.as_slice() {
                    return self.lower(*only);
                }
                NodeKind::Other(self.all(&children))
            }
            "string" | "concatenated_string" => self.string(node),
            "integer" | "float" => NodeKind::Literal(Literal::Number(self.text(node).to_string())),
            "true" => NodeKind::Literal(Literal::Bool(true)),
            "false" => NodeKind::Literal(Literal::Bool(false)),
            "none" => NodeKind::Literal(Literal::None),
            "ellipsis" => NodeKind::Literal(Literal::Ellipsis),
            "tuple" | "expression_list" => NodeKind::Tuple(self.all(&named_children(node))),
            _ => NodeKind::Other(self.all(&named_children(node))),
        };
        AstNode::new(kind, start, end)
    }

    fn function(&self, node: Node<'_>) -> FunctionDef {
        FunctionDef {
            name: node
                .child_by_field_name("name")
                .map(|n| self.text(n).to_string())
                .unwrap_or_default(),
            params: node
                .child_by_field_name("parameters")
                .map(|p| self.params(p))
                .unwrap_or_default(),
            body: self.block(node.child_by_field_name("body")),
            is_async: is_async(node),
        }
    }

    fn params(&self, node: Node<'_>) -> Vec<Param> {
        named_children(node)
            .into_iter()
            .filter_map(|child| self.param(child))
            .collect()
    }

    fn param(&self, node: Node<'_>) -> Option<Param> {
        let (name, kind) = match node.kind() {
            "identifier" => (self.text(node), ParamKind::Positional),
            "default_parameter" | "typed_default_parameter" => (
                node.child_by_field_name("name")
                    .map_or("", |n| self.text(n)),
                ParamKind::Positional,
            ),
            "typed_parameter" => return named_children(node).first().and_then(|n| self.param(*n)),
            "list_splat_pattern" => (self.splat_name(node), ParamKind::VarPositional),
            "dictionary_splat_pattern" => (self.splat_name(node), ParamKind::VarKeyword),
            "tuple_pattern" => (self.text(node), ParamKind::Positional),
            // `*` and `/` markers
            _ => return None,
        };
        Some(Param {
            name: name.to_string(),
            kind,
        })
    }

    fn splat_name(&self, node: Node<'_>) -> &'s str {
        named_children(node)
            .first()
            .map_or("", |n| self.text(*n))
    }

    fn class(&self, node: Node<'_>) -> ClassDef {
        let bases = node
            .child_by_field_name("superclasses")
            .map(|args| {
                named_children(args)
                    .into_iter()
                    .filter_map(|base| self.dotted(base))
                    .collect()
            })
            .unwrap_or_default();
        ClassDef {
            name: node
                .child_by_field_name("name")
                .map(|n| self.text(n).to_string())
                .unwrap_or_default(),
            bases,
            body: self.block(node.child_by_field_name("body")),
        }
    }

    fn if_chain(&self, node: Node<'_>, is_elif: bool) -> If {
        let mut cursor = node.walk();
        let alternatives: Vec<Node<'_>> = node
            .children_by_field_name("alternative", &mut cursor)
            .collect();
        If {
            test: Box::new(self.condition(node)),
            body: self.block(node.child_by_field_name("consequence")),
            orelse: self.orelse(&alternatives),
            is_elif,
        }
    }

    /// Rebuilds the nested `orelse` shape from a flat list of `elif`/`else` clauses.
    fn orelse(&self, alternatives: &[Node<'_>]) -> Vec<AstNode> {
        let Some((first, rest)) = alternatives.split_first() else {
            return Vec::new();
        };
        match first.kind() {
            "elif_clause" => vec![self.nested(*first, || {
                let start = span(*first).0;
                let end = alternatives.last().map_or(start, |n| span(*n).1);
                let branch = If {
                    test: Box::new(self.condition(*first)),
                    body: self.block(first.child_by_field_name("consequence")),
                    orelse: self.orelse(rest),
                    is_elif: true,
                };
                AstNode::new(NodeKind::If(branch), start, end)
            })],
            _ => self.else_body(Some(*first)),
        }
    }

    fn condition(&self, node: Node<'_>) -> AstNode {
        self.field(node, "condition")
            .unwrap_or_else(|| empty(node))
    }

    fn else_body(&self, clause: Option<Node<'_>>) -> Vec<AstNode> {
        clause
            .map(|c| {
                self.block(
                    c.child_by_field_name("body")
                        .or_else(|| first_of_kind(c, "block")),
                )
            })
            .unwrap_or_default()
    }

    fn for_loop(&self, node: Node<'_>) -> Loop {
        Loop {
            header: ["left", "right"]
                .iter()
                .filter_map(|f| self.field(node, f))
                .collect(),
            body: self.block(node.child_by_field_name("body")),
            orelse: self.else_body(node.child_by_field_name("alternative")),
        }
    }

    fn try_block(&self, node: Node<'_>) -> Try {
        let mut block = Try {
            body: self.block(node.child_by_field_name("body")),
            handlers: Vec::new(),
            orelse: Vec::new(),
            finalbody: Vec::new(),
        };
        for child in named_children(node) {
            match child.kind() {
                "except_clause" | "except_group_clause" => block.handlers.push(self.lower(child)),
                "else_clause" => block.orelse = self.else_body(Some(child)),
                "finally_clause" => block.finalbody = self.block(first_of_kind(child, "block")),
                _ => {}
            }
        }
        block
    }

    fn handler(&self, node: Node<'_>) -> ExceptHandler {
        let parts: Vec<Node<'_>> = named_children(node)
            .into_iter()
            .filter(|n| n.kind() != "block")
            .collect();
        let (type_expr, name) = match parts.as_slice() {
            [] => (None, None),
            [pattern, ..] if pattern.kind() == "as_pattern" => (
                named_children(*pattern).first().map(|t| self.lower(*t)),
                pattern
                    .child_by_field_name("alias")
                    .map(|a| self.text(a).to_string()),
            ),
            [ty, alias, ..] => (Some(self.lower(*ty)), Some(self.text(*alias).to_string())),
            [ty] => (Some(self.lower(*ty)), None),
        };
        ExceptHandler {
            type_expr: type_expr.map(Box::new),
            name,
            body: self.block(first_of_kind(node, "block")),
        }
    }

    fn with_block(&self, node: Node<'_>) -> With {
        let items = first_of_kind(node, "with_clause")
            .map(|clause| {
                named_children(clause)
                    .into_iter()
                    .map(|item| match item.child_by_field_name("value") {
                        Some(value) => self.lower(value),
                        None => self.lower(item),
                    })
                    .collect()
            })
            .unwrap_or_default();
        With {
            items,
            body: self.block(node.child_by_field_name("body")),
        }
    }

    /// Operands of a chain of the same operator, left to right: `a and b and c`
    /// gives three values.
    fn bool_operands(&self, node: Node<'_>, op: BoolOperator) -> Vec<AstNode> {
        let mut values = Vec::new();
        let mut pending = vec![node];
        while let Some(current) = pending.pop() {
            if current.kind() == "boolean_operator" && bool_operator(current) == op {
                pending.extend(
                    ["right", "left"]
                        .iter()
                        .filter_map(|side| current.child_by_field_name(side)),
                );
            } else {
                values.push(self.lower(current));
            }
        }
        values
    }

    fn comprehension(&self, node: Node<'_>) -> Comprehension {
        let element = match node.child_by_field_name("body") {
            Some(body) if body.kind() == "pair" => ["key", "value"]
                .iter()
                .filter_map(|f| self.field(body, f))
                .collect(),
            Some(body) => vec![self.lower(body)],
            None => Vec::new(),
        };
        let mut generators: Vec<Generator> = Vec::new();
        for child in named_children(node) {
            match child.kind() {
                "for_in_clause" => {
                    let mut cursor = child.walk();
                    let mut header: Vec<AstNode> = self.field(child, "left").into_iter().collect();
                    header.extend(
                        child
                            .children_by_field_name("right", &mut cursor)
                            .map(|n| self.lower(n)),
                    );
                    generators.push(Generator {
                        header,
                        ifs: Vec::new(),
                    });
                }
                "if_clause" => {
                    if let (Some(generator), Some(test)) =
                        (generators.last_mut(), named_children(child).first())
                    {
                        generator.ifs.push(self.lower(*test));
                    }
                }
                _ => {}
            }
        }
        Comprehension {
            element,
            generators,
        }
    }

    fn call(&self, node: Node<'_>) -> Call {
        let func = node.child_by_field_name("function");
        let callee = func.map(|f| self.callee(f)).unwrap_or_default();
        let args = match node.child_by_field_name("arguments") {
            Some(args) if args.kind() == "argument_list" => named_children(args)
                .into_iter()
                .map(|arg| match arg.kind() {
                    "keyword_argument" => self
                        .field(arg, "value")
                        .unwrap_or_else(|| empty(arg)),
                    _ => self.lower(arg),
                })
                .collect(),
            Some(generator) => vec![self.lower(generator)],
            None => Vec::new(),
        };
        Call {
            callee,
            func: Box::new(
                func.map(|f| self.lower(f))
                    .unwrap_or_else(|| empty(node)),
            ),
            args,
        }
    }

    /// Attribute names down the receiver chain, plus the root when it is a
    /// plain name: `a.b.c` for `a.b.c()`, `get` for `Session().get()`.
    fn callee(&self, func: Node<'_>) -> String {
        let mut parts: Vec<&str> = Vec::new();
        let mut current = func;
        while current.kind() == "attribute" {
            if let Some(attr) = current.child_by_field_name("attribute") {
                parts.push(self.text(attr));
            }
            match current.child_by_field_name("object") {
                Some(object) => current = object,
                None => break,
            }
        }
        if current.kind() == "identifier" {
            parts.push(self.text(current));
        }
        parts.reverse();
        parts.join(".")
    }

    /// Dotted name of an identifier or an attribute chain made only of identifiers.
    fn dotted(&self, node: Node<'_>) -> Option<String> {
        match node.kind() {
            "identifier" => Some(self.text(node).to_string()),
            "attribute" => {
                let object = self.dotted(node.child_by_field_name("object")?)?;
                let attr = self.text(node.child_by_field_name("attribute")?);
                Some(format!("{object}.{attr}"))
            }
            _ => None,
        }
    }

    fn raise(&self, node: Node<'_>) -> Raise {
        let cause = node.child_by_field_name("cause");
        let exc = named_children(node)
            .into_iter()
            .find(|n| Some(n.id()) != cause.map(|c| c.id()));
        Raise {
            exc: exc.map(|n| Box::new(self.lower(n))),
            cause: cause.map(|n| Box::new(self.lower(n))),
        }
    }

    fn identifiers(&self, node: Node<'_>) -> Vec<String> {
        named_children(node)
            .into_iter()
            .filter(|n| n.kind() == "identifier")
            .map(|n| self.text(n).to_string())
            .collect()
    }

    fn imports(&self, node: Node<'_>) -> Vec<String> {
        if let Some(module) = node.child_by_field_name("module_name") {
            return vec![self.text(module).to_string()];
        }
        named_children(node)
            .into_iter()
            .filter_map(|n| match n.kind() {
                "dotted_name" => Some(self.text(n).to_string()),
                "aliased_import" => n
                    .child_by_field_name("name")
                    .map(|name| self.text(name).to_string()),
                _ => None,
            })
            .collect()
    }

    fn string(&self, node: Node<'_>) -> NodeKind {
        let mut content = String::new();
        let mut interpolations = Vec::new();
        self.string_parts(node, &mut content, &mut interpolations);
        if !interpolations.is_empty() {
            NodeKind::Other(interpolations)
        } else if self.is_bytes(node) {
            NodeKind::Literal(Literal::Bytes(content))
        } else {
            NodeKind::Literal(Literal::Str(content))
        }
    }

    /// Whether the (first) string's prefix carries `b`.
    fn is_bytes(&self, node: Node<'_>) -> bool {
        let mut current = node;
        while current.kind() == "concatenated_string" {
            match named_children(current).first() {
                Some(first) => current = *first,
                None => return false,
            }
        }
        first_of_kind(current, "string_start")
            .is_some_and(|start| self.text(start).contains(['b', 'B']))
    }

    fn string_parts(&self, node: Node<'_>, content: &mut String, exprs: &mut Vec<AstNode>) {
        for child in named_children(node) {
            match child.kind() {
                "string" => self.string_parts(child, content, exprs),
                "string_content" | "escape_sequence" => content.push_str(self.text(child)),
                "interpolation" => {
                    if let Some(expr) = child.child_by_field_name("expression") {
                        exprs.push(self.lower(expr));
                    }
                }
                _ => {}
            }
        }
    }
}

/// Named children without comments.
fn named_children(node: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|n| n.kind() != "comment")
        .collect()
}

fn first_of_kind<'t>(node: Node<'t>, kind: &str) -> Option<Node<'t>> {
    named_children(node).into_iter().find(|n| n.kind() == kind)
}

fn is_async(node: Node<'_>) -> bool {
    node.child(0).is_some_and(|c| c.kind() == "async")
}

fn bool_operator(node: Node<'_>) -> BoolOperator {
    match node.child_by_field_name("operator").map(|n| n.kind()) {
        Some("or") => BoolOperator::Or,
        _ => BoolOperator::And,
    }
}

fn empty(node: Node<'_>) -> AstNode {
    let (start, end) = span(node);
    AstNode::new(NodeKind::Other(Vec::new()), start, end)
}

/// 1-indexed inclusive line span. Trailing comments are not part of a node,
/// and a node ending at column 0 ends on the previous line.
fn span(node: Node<'_>) -> (usize, usize) {
    let start = node.start_position();
    let end = content_end(node);
    let end_line = if end.column == 0 && end.row > start.row {
        end.row
    } else {
        end.row + 1
    };
    (start.row + 1, end_line)
}

/// End of the last token that is not a comment.
///
/// Tree-sitter attaches comments that follow a block's last statement to the
/// block, so a function's node can run past its final statement.
fn content_end(node: Node<'_>) -> Point {
    let mut current = node;
    loop {
        let mut cursor = current.walk();
        let last = current
            .children(&mut cursor)
            .filter(|c| c.kind() != "comment")
            .last();
        match last {
            Some(child) => current = child,
            None => return current.end_position(),
        }
    }
}
