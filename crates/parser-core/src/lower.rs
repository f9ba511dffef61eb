//! Lowers the tree-sitter CST into the typed [`crate::ast`] tree.
//!
//! Unknown node kinds degrade gracefully: declarations that cannot be
//! recognized are skipped, expressions collapse to `Expr::Literal`.

use crate::ast::*;
use tree_sitter::Node;

fn text<'a>(node: Node, source: &'a str) -> &'a str {
    node.utf8_text(source.as_bytes()).unwrap_or("")
}

fn range(node: Node) -> ByteRange {
    ByteRange::new(node.start_byte(), node.end_byte())
}

/// Collect the `//` comment block immediately preceding a node.
fn doc_comment(node: Node, source: &str) -> String {
    let mut lines = Vec::new();
    let mut prev = node.prev_sibling();
    while let Some(p) = prev {
        if p.kind() != "comment" {
            break;
        }
        match text(p, source).strip_prefix("//") {
            Some(stripped) => lines.push(stripped.trim().to_string()),
            None => break,
        }
        prev = p.prev_sibling();
    }
    lines.reverse();
    lines.join(" ")
}

pub fn lower_file(root: Node, source: &str) -> GoFile {
    let mut file = GoFile::default();
    let mut cursor = root.walk();
    for child in root.named_children(&mut cursor) {
        match child.kind() {
            "package_clause" => {
                let mut inner = child.walk();
                for c in child.named_children(&mut inner) {
                    if c.kind() == "package_identifier" {
                        file.package_name = text(c, source).to_string();
                    }
                }
            }
            "import_declaration" => collect_import_specs(child, source, &mut file.imports),
            "function_declaration" | "method_declaration" => {
                file.decls.push(Decl::Func(lower_func(child, source)));
            }
            "type_declaration" => {
                let mut inner = child.walk();
                for spec in child.named_children(&mut inner) {
                    if spec.kind() == "type_spec" {
                        if let Some(decl) = lower_type_spec(spec, child, source) {
                            file.decls.push(Decl::Type(decl));
                        }
                    }
                }
            }
            "const_declaration" => lower_value_decls(child, source, ValueKind::Const, &mut file.decls),
            "var_declaration" => lower_value_decls(child, source, ValueKind::Var, &mut file.decls),
            _ => {}
        }
    }
    file
}

// ── Imports ──

fn collect_import_specs(node: Node, source: &str, out: &mut Vec<ImportSpec>) {
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        match child.kind() {
            "import_spec" => {
                if let Some(spec) = lower_import_spec(child, source) {
                    out.push(spec);
                }
            }
            "import_spec_list" => collect_import_specs(child, source, out),
            _ => {}
        }
    }
}

fn lower_import_spec(node: Node, source: &str) -> Option<ImportSpec> {
    let path_node = node.child_by_field_name("path")?;
    let path = text(path_node, source)
        .trim_matches('"')
        .trim_matches('`')
        .to_string();
    if path.is_empty() {
        return None;
    }
    let alias = node
        .child_by_field_name("name")
        .filter(|n| n.kind() == "package_identifier")
        .map(|n| text(n, source).to_string());
    Some(ImportSpec {
        alias,
        path,
        range: range(node),
    })
}

// ── Values ──

fn lower_value_decls(node: Node, source: &str, kind: ValueKind, out: &mut Vec<Decl>) {
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        match child.kind() {
            "const_spec" | "var_spec" => {
                out.push(Decl::Value(lower_value_spec(child, node, source, kind)));
            }
            "const_spec_list" | "var_spec_list" => lower_value_decls(child, source, kind, out),
            _ => {}
        }
    }
}

fn lower_value_spec(spec: Node, decl: Node, source: &str, kind: ValueKind) -> ValueDecl {
    let mut cursor = spec.walk();
    let names = spec
        .children_by_field_name("name", &mut cursor)
        .map(|n| text(n, source).to_string())
        .collect();
    let type_expr = spec
        .child_by_field_name("type")
        .map(|n| lower_type(n, source));
    let values = spec
        .child_by_field_name("value")
        .map(|list| {
            let mut c = list.walk();
            list.named_children(&mut c)
                .map(|n| lower_expr(n, source))
                .collect()
        })
        .unwrap_or_default();
    let mut doc = doc_comment(spec, source);
    if doc.is_empty() {
        doc = doc_comment(decl, source);
    }
    ValueDecl {
        names,
        kind,
        type_expr,
        values,
        doc,
        range: range(spec),
    }
}

// ── Types ──

fn lower_type_spec(spec: Node, decl: Node, source: &str) -> Option<TypeDecl> {
    let name = text(spec.child_by_field_name("name")?, source).to_string();
    let type_node = spec.child_by_field_name("type")?;
    let kind = match type_node.kind() {
        "struct_type" => TypeDeclKind::Struct {
            fields: lower_struct_fields(type_node, source),
        },
        "interface_type" => lower_interface_body(type_node, source),
        // Type aliases and defined non-composite types carry no symbols.
        _ => return None,
    };
    let mut doc = doc_comment(spec, source);
    if doc.is_empty() {
        doc = doc_comment(decl, source);
    }
    Some(TypeDecl {
        name,
        kind,
        doc,
        range: range(spec),
    })
}

fn lower_struct_fields(struct_type: Node, source: &str) -> Vec<FieldDecl> {
    let mut fields = Vec::new();
    let mut cursor = struct_type.walk();
    for list in struct_type.named_children(&mut cursor) {
        if list.kind() != "field_declaration_list" {
            continue;
        }
        let mut inner = list.walk();
        for field in list.named_children(&mut inner) {
            if field.kind() == "field_declaration" {
                lower_field_decl(field, source, &mut fields);
            }
        }
    }
    fields
}

fn lower_field_decl(node: Node, source: &str, out: &mut Vec<FieldDecl>) {
    // Older grammar versions expose embedded types as bare children
    // instead of a `type` field.
    let type_node = match node.child_by_field_name("type").or_else(|| {
        let mut c = node.walk();
        let found = node.named_children(&mut c).find(|n| {
            matches!(
                n.kind(),
                "type_identifier" | "qualified_type" | "generic_type" | "pointer_type"
            )
        });
        found
    }) {
        Some(n) => n,
        None => return,
    };
    let mut cursor = node.walk();
    let names: Vec<String> = node
        .children_by_field_name("name", &mut cursor)
        .map(|n| text(n, source).to_string())
        .collect();
    let doc = doc_comment(node, source);

    if names.is_empty() {
        // Embedded field: an optional `*` token precedes the type.
        let mut pointer = false;
        let mut c = node.walk();
        for child in node.children(&mut c) {
            if child.kind() == "*" {
                pointer = true;
            }
        }
        let inner = lower_type(type_node, source);
        let (type_expr, type_string) = if pointer {
            (
                TypeExpr::Pointer(Box::new(inner)),
                format!("*{}", text(type_node, source)),
            )
        } else {
            (inner, text(type_node, source).to_string())
        };
        out.push(FieldDecl {
            name: None,
            type_expr,
            type_string,
            doc,
        });
        return;
    }

    let type_expr = lower_type(type_node, source);
    let type_string = text(type_node, source).to_string();
    for name in names {
        out.push(FieldDecl {
            name: Some(name),
            type_expr: type_expr.clone(),
            type_string: type_string.clone(),
            doc: doc.clone(),
        });
    }
}

fn lower_interface_body(interface_type: Node, source: &str) -> TypeDeclKind {
    let mut methods = Vec::new();
    let mut embedded = Vec::new();
    let mut cursor = interface_type.walk();
    for child in interface_type.named_children(&mut cursor) {
        match child.kind() {
            // Grammar versions differ on the member node name.
            "method_elem" | "method_spec" => {
                if let Some(name_node) = child.child_by_field_name("name") {
                    methods.push(MethodSpec {
                        name: text(name_node, source).to_string(),
                        params: child
                            .child_by_field_name("parameters")
                            .map(|p| lower_param_list(p, source))
                            .unwrap_or_default(),
                        results: lower_results(child, source),
                        doc: doc_comment(child, source),
                    });
                }
            }
            "type_elem" => {
                let mut inner = child.walk();
                for ty in child.named_children(&mut inner) {
                    embedded.push(lower_type(ty, source));
                }
            }
            "type_identifier" | "qualified_type" | "generic_type" => {
                embedded.push(lower_type(child, source));
            }
            _ => {}
        }
    }
    TypeDeclKind::Interface { methods, embedded }
}

pub fn lower_type(node: Node, source: &str) -> TypeExpr {
    match node.kind() {
        "type_identifier" | "identifier" | "package_identifier" => {
            TypeExpr::Ident(text(node, source).to_string())
        }
        "qualified_type" => {
            let package = node
                .child_by_field_name("package")
                .map(|n| text(n, source).to_string())
                .unwrap_or_default();
            let name = node
                .child_by_field_name("name")
                .map(|n| text(n, source).to_string())
                .unwrap_or_default();
            TypeExpr::Qualified { package, name }
        }
        "pointer_type" => match node.named_child(0) {
            Some(inner) => TypeExpr::Pointer(Box::new(lower_type(inner, source))),
            None => TypeExpr::Other(text(node, source).to_string()),
        },
        "slice_type" | "array_type" => match node.child_by_field_name("element") {
            Some(elem) => TypeExpr::Slice(Box::new(lower_type(elem, source))),
            None => TypeExpr::Other(text(node, source).to_string()),
        },
        "map_type" => {
            match (
                node.child_by_field_name("key"),
                node.child_by_field_name("value"),
            ) {
                (Some(key), Some(value)) => TypeExpr::Map {
                    key: Box::new(lower_type(key, source)),
                    value: Box::new(lower_type(value, source)),
                },
                _ => TypeExpr::Other(text(node, source).to_string()),
            }
        }
        "generic_type" => {
            let base = node
                .child_by_field_name("type")
                .or_else(|| node.named_child(0));
            let args = node
                .child_by_field_name("type_arguments")
                .map(|list| {
                    let mut c = list.walk();
                    list.named_children(&mut c)
                        .map(|n| lower_type(n, source))
                        .collect()
                })
                .unwrap_or_default();
            match base {
                Some(base) => TypeExpr::Generic {
                    base: Box::new(lower_type(base, source)),
                    args,
                },
                None => TypeExpr::Other(text(node, source).to_string()),
            }
        }
        "channel_type" => {
            let inner = node
                .child_by_field_name("value")
                .or_else(|| node.named_child(0));
            match inner {
                Some(inner) => TypeExpr::Chan(Box::new(lower_type(inner, source))),
                None => TypeExpr::Other(text(node, source).to_string()),
            }
        }
        "parenthesized_type" => match node.named_child(0) {
            Some(inner) => lower_type(inner, source),
            None => TypeExpr::Other(text(node, source).to_string()),
        },
        "function_type" => TypeExpr::Func,
        _ => TypeExpr::Other(text(node, source).to_string()),
    }
}

// ── Functions ──

fn lower_func(node: Node, source: &str) -> FuncDecl {
    let name = node
        .child_by_field_name("name")
        .map(|n| text(n, source).to_string())
        .unwrap_or_default();
    let receiver = node
        .child_by_field_name("receiver")
        .and_then(|r| lower_receiver(r, source));
    let params = node
        .child_by_field_name("parameters")
        .map(|p| lower_param_list(p, source))
        .unwrap_or_default();
    let results = lower_results(node, source);
    let body = node.child_by_field_name("body").map(|b| lower_block(b, source));
    FuncDecl {
        name,
        receiver,
        params,
        results,
        body,
        doc: doc_comment(node, source),
        range: range(node),
    }
}

fn lower_receiver(receiver_list: Node, source: &str) -> Option<Receiver> {
    let mut cursor = receiver_list.walk();
    for child in receiver_list.named_children(&mut cursor) {
        if child.kind() != "parameter_declaration" {
            continue;
        }
        let type_node = child.child_by_field_name("type")?;
        let type_expr = lower_type(type_node, source);
        let type_name = receiver_base_name(&type_expr)?;
        let name = child
            .child_by_field_name("name")
            .map(|n| text(n, source).to_string());
        return Some(Receiver {
            name,
            type_name,
            type_expr,
        });
    }
    None
}

/// Peel one level of pointer and generic wrapping off a receiver type.
fn receiver_base_name(expr: &TypeExpr) -> Option<String> {
    match expr {
        TypeExpr::Ident(name) => Some(name.clone()),
        TypeExpr::Pointer(inner) | TypeExpr::Generic { base: inner, .. } => {
            receiver_base_name(inner)
        }
        _ => None,
    }
}

fn lower_param_list(list: Node, source: &str) -> Vec<ParamDecl> {
    let mut params = Vec::new();
    let mut cursor = list.walk();
    for child in list.named_children(&mut cursor) {
        match child.kind() {
            "parameter_declaration" | "variadic_parameter_declaration" => {
                if let Some(type_node) = child.child_by_field_name("type") {
                    let mut c = child.walk();
                    let name = child
                        .children_by_field_name("name", &mut c)
                        .next()
                        .map(|n| text(n, source).to_string());
                    params.push(ParamDecl {
                        name,
                        type_expr: lower_type(type_node, source),
                        type_string: text(type_node, source).to_string(),
                    });
                }
            }
            _ => {}
        }
    }
    params
}

/// Lower the `result` field of a function or method spec: either a
/// parameter list or a single bare type.
fn lower_results(node: Node, source: &str) -> Vec<ParamDecl> {
    match node.child_by_field_name("result") {
        Some(result) if result.kind() == "parameter_list" => lower_param_list(result, source),
        Some(result) => vec![ParamDecl {
            name: None,
            type_expr: lower_type(result, source),
            type_string: text(result, source).to_string(),
        }],
        None => Vec::new(),
    }
}

// ── Statements ──

pub fn lower_block(node: Node, source: &str) -> Block {
    let mut stmts = Vec::new();
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        if let Some(stmt) = lower_stmt(child, source) {
            stmts.push(stmt);
        }
    }
    Block { stmts }
}

fn lower_expr_list(node: Node, source: &str) -> Vec<Expr> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .map(|n| lower_expr(n, source))
        .collect()
}

fn lower_stmt(node: Node, source: &str) -> Option<Stmt> {
    match node.kind() {
        "expression_statement" => Some(Stmt::Expr(lower_expr(node.named_child(0)?, source))),
        "send_statement" => {
            let channel = node
                .child_by_field_name("channel")
                .map(|n| lower_expr(n, source))
                .unwrap_or(Expr::Literal);
            let value = node
                .child_by_field_name("value")
                .map(|n| lower_expr(n, source))
                .unwrap_or(Expr::Literal);
            Some(Stmt::Send { channel, value })
        }
        "inc_statement" | "dec_statement" => {
            Some(Stmt::Expr(lower_expr(node.named_child(0)?, source)))
        }
        "assignment_statement" | "short_var_declaration" => {
            let lhs = node
                .child_by_field_name("left")
                .map(|n| lower_expr_list(n, source))
                .unwrap_or_default();
            let rhs = node
                .child_by_field_name("right")
                .map(|n| lower_expr_list(n, source))
                .unwrap_or_default();
            Some(Stmt::Assign {
                lhs,
                rhs,
                define: node.kind() == "short_var_declaration",
            })
        }
        "var_declaration" | "const_declaration" => {
            let kind = if node.kind() == "const_declaration" {
                ValueKind::Const
            } else {
                ValueKind::Var
            };
            let mut decls = Vec::new();
            lower_value_decls(node, source, kind, &mut decls);
            let specs = decls
                .into_iter()
                .filter_map(|d| match d {
                    Decl::Value(v) => Some(v),
                    _ => None,
                })
                .collect();
            Some(Stmt::VarDecl(specs))
        }
        "return_statement" => {
            let exprs = node
                .named_child(0)
                .map(|list| {
                    if list.kind() == "expression_list" {
                        lower_expr_list(list, source)
                    } else {
                        vec![lower_expr(list, source)]
                    }
                })
                .unwrap_or_default();
            Some(Stmt::Return(exprs))
        }
        "go_statement" => Some(Stmt::Go(lower_expr(node.named_child(0)?, source))),
        "defer_statement" => Some(Stmt::Defer(lower_expr(node.named_child(0)?, source))),
        "if_statement" => {
            let init = node
                .child_by_field_name("initializer")
                .and_then(|n| lower_stmt(n, source))
                .map(Box::new);
            let cond = node
                .child_by_field_name("condition")
                .map(|n| lower_expr(n, source));
            let body = node
                .child_by_field_name("consequence")
                .map(|b| lower_block(b, source))
                .unwrap_or_default();
            let else_branch = node
                .child_by_field_name("alternative")
                .and_then(|n| lower_stmt(n, source))
                .map(Box::new);
            Some(Stmt::If {
                init,
                cond,
                body,
                else_branch,
            })
        }
        "for_statement" => lower_for(node, source),
        "block" => Some(Stmt::Block(lower_block(node, source))),
        "expression_switch_statement" | "type_switch_statement" | "select_statement" => {
            Some(Stmt::Block(lower_switch_like(node, source)))
        }
        "labeled_statement" => {
            let mut cursor = node.walk();
            for child in node.named_children(&mut cursor) {
                if let Some(stmt) = lower_stmt(child, source) {
                    return Some(stmt);
                }
            }
            None
        }
        // Bare expressions used as statements still carry calls.
        _ => match lower_expr(node, source) {
            Expr::Literal => None,
            expr => Some(Stmt::Expr(expr)),
        },
    }
}

fn lower_for(node: Node, source: &str) -> Option<Stmt> {
    let body = node
        .child_by_field_name("body")
        .map(|b| lower_block(b, source))
        .unwrap_or_default();

    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        match child.kind() {
            "range_clause" => {
                let lhs = child
                    .child_by_field_name("left")
                    .map(|n| lower_expr_list(n, source))
                    .unwrap_or_default();
                let expr = child
                    .child_by_field_name("right")
                    .map(|n| lower_expr(n, source))
                    .unwrap_or(Expr::Literal);
                return Some(Stmt::Range { lhs, expr, body });
            }
            "for_clause" => {
                let init = child
                    .child_by_field_name("initializer")
                    .and_then(|n| lower_stmt(n, source))
                    .map(Box::new);
                let cond = child
                    .child_by_field_name("condition")
                    .map(|n| lower_expr(n, source));
                let post = child
                    .child_by_field_name("update")
                    .and_then(|n| lower_stmt(n, source))
                    .map(Box::new);
                return Some(Stmt::For {
                    init,
                    cond,
                    post,
                    body,
                });
            }
            _ => {}
        }
    }

    // `for cond { ... }` — the bare condition is a direct child.
    let cond = {
        let mut c = node.walk();
        let found = node
            .named_children(&mut c)
            .find(|n| n.kind() != "block")
            .map(|n| lower_expr(n, source));
        found
    };
    Some(Stmt::For {
        init: None,
        cond,
        post: None,
        body,
    })
}

/// Flatten switch/select bodies into a plain block: case values and case
/// statements all become visitable statements.
fn lower_switch_like(node: Node, source: &str) -> Block {
    let mut stmts = Vec::new();
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        match child.kind() {
            "expression_case" | "default_case" | "type_case" | "communication_case" => {
                let mut inner = child.walk();
                for c in child.named_children(&mut inner) {
                    if c.kind() == "expression_list" {
                        for expr in lower_expr_list(c, source) {
                            stmts.push(Stmt::Expr(expr));
                        }
                    } else if let Some(stmt) = lower_stmt(c, source) {
                        stmts.push(stmt);
                    }
                }
            }
            _ => {
                if let Some(stmt) = lower_stmt(child, source) {
                    stmts.push(stmt);
                } else if child.kind() != "block" {
                    stmts.push(Stmt::Expr(lower_expr(child, source)));
                }
            }
        }
    }
    Block { stmts }
}

// ── Expressions ──

pub fn lower_expr(node: Node, source: &str) -> Expr {
    match node.kind() {
        "identifier" | "field_identifier" | "type_identifier" | "package_identifier" => {
            Expr::Ident(text(node, source).to_string())
        }
        "selector_expression" => {
            let operand = node
                .child_by_field_name("operand")
                .map(|n| lower_expr(n, source))
                .unwrap_or(Expr::Literal);
            let field = node
                .child_by_field_name("field")
                .map(|n| text(n, source).to_string())
                .unwrap_or_default();
            Expr::Selector {
                operand: Box::new(operand),
                field,
            }
        }
        "call_expression" => {
            let callee = node
                .child_by_field_name("function")
                .map(|n| lower_expr(n, source))
                .unwrap_or(Expr::Literal);
            let args = node
                .child_by_field_name("arguments")
                .map(|list| lower_expr_list(list, source))
                .unwrap_or_default();
            Expr::Call {
                callee: Box::new(callee),
                args,
            }
        }
        "index_expression" => {
            let operand = node
                .child_by_field_name("operand")
                .map(|n| lower_expr(n, source))
                .unwrap_or(Expr::Literal);
            let index = node
                .child_by_field_name("index")
                .map(|n| lower_expr(n, source))
                .unwrap_or(Expr::Literal);
            Expr::Index {
                operand: Box::new(operand),
                index: Box::new(index),
            }
        }
        "slice_expression" => {
            let operand = node
                .child_by_field_name("operand")
                .map(|n| lower_expr(n, source))
                .unwrap_or(Expr::Literal);
            let bound = |field: &str| {
                node.child_by_field_name(field)
                    .map(|n| Box::new(lower_expr(n, source)))
            };
            Expr::Slice {
                operand: Box::new(operand),
                low: bound("start"),
                high: bound("end"),
                max: bound("capacity"),
            }
        }
        "type_assertion_expression" => {
            let operand = node
                .child_by_field_name("operand")
                .map(|n| lower_expr(n, source))
                .unwrap_or(Expr::Literal);
            let ty = node
                .child_by_field_name("type")
                .map(|n| lower_type(n, source))
                .unwrap_or(TypeExpr::Other(String::new()));
            Expr::TypeAssert {
                operand: Box::new(operand),
                ty,
            }
        }
        "unary_expression" => {
            let op = match node
                .child_by_field_name("operator")
                .map(|n| text(n, source))
            {
                Some("&") => UnaryOp::Ref,
                Some("*") => UnaryOp::Deref,
                _ => UnaryOp::Other,
            };
            let operand = node
                .child_by_field_name("operand")
                .map(|n| lower_expr(n, source))
                .unwrap_or(Expr::Literal);
            Expr::Unary {
                op,
                operand: Box::new(operand),
            }
        }
        "binary_expression" => {
            let left = node
                .child_by_field_name("left")
                .map(|n| lower_expr(n, source))
                .unwrap_or(Expr::Literal);
            let right = node
                .child_by_field_name("right")
                .map(|n| lower_expr(n, source))
                .unwrap_or(Expr::Literal);
            Expr::Binary {
                left: Box::new(left),
                right: Box::new(right),
            }
        }
        "parenthesized_expression" => match node.named_child(0) {
            Some(inner) => Expr::Paren(Box::new(lower_expr(inner, source))),
            None => Expr::Literal,
        },
        "composite_literal" => {
            let ty = node
                .child_by_field_name("type")
                .map(|n| lower_type(n, source));
            let elems = node
                .child_by_field_name("body")
                .map(|body| lower_literal_value(body, source))
                .unwrap_or_default();
            Expr::Composite { ty, elems }
        }
        "func_literal" => {
            let body = node
                .child_by_field_name("body")
                .map(|b| lower_block(b, source))
                .unwrap_or_default();
            Expr::FuncLit(body)
        }
        _ => Expr::Literal,
    }
}

fn lower_literal_value(body: Node, source: &str) -> Vec<Expr> {
    let mut elems = Vec::new();
    let mut cursor = body.walk();
    for child in body.named_children(&mut cursor) {
        match child.kind() {
            "keyed_element" => {
                // Keys carry calls too (map literals with computed keys),
                // so both halves are lowered.
                let mut inner = child.walk();
                for part in child.named_children(&mut inner) {
                    elems.push(lower_element(part, source));
                }
            }
            "literal_element" => elems.push(lower_element(child, source)),
            _ => elems.push(lower_expr(child, source)),
        }
    }
    elems
}

/// Grammar versions wrap element values in `literal_element`; unwrap it.
fn lower_element(node: Node, source: &str) -> Expr {
    if node.kind() == "literal_element" {
        match node.named_child(0) {
            Some(inner) => lower_expr(inner, source),
            None => Expr::Literal,
        }
    } else {
        lower_expr(node, source)
    }
}
