//! Call-graph construction: walk a function body, resolve every
//! syntactically recognizable call form, and emit `Call` edges in
//! source-traversal order.
//!
//! Assignment statements populate a per-function binding map before
//! their children are visited, so later `x.Method()` calls resolve.
//! Unresolvable callees are dropped silently.

use crate::model::{CodeModel, EntityId, FunctionId};
use crate::resolve::Resolver;
use graph_store::{Relation, RelationType};
use parser_core::ast::{Block, Expr, Stmt, UnaryOp};
use rustc_hash::{FxHashMap, FxHashSet};

/// Call edges of one function body, deduplicated locally.
pub fn function_calls(model: &CodeModel, function: FunctionId) -> Vec<Relation> {
    let data = model.function(function);
    let body = match &data.body {
        Some(body) => body,
        None => return Vec::new(),
    };
    let mut visitor = CallVisitor::new(model, function);
    visitor.seed_bindings();
    visitor.visit_block(body);
    visitor.edges
}

struct CallVisitor<'m> {
    model: &'m CodeModel,
    resolver: Resolver<'m>,
    function: FunctionId,
    source_id: String,
    /// Identifier → entity, from receiver, parameters, declarations and
    /// assignments seen so far.
    locals: FxHashMap<String, EntityId>,
    edges: Vec<Relation>,
    seen: FxHashSet<FunctionId>,
}

impl<'m> CallVisitor<'m> {
    fn new(model: &'m CodeModel, function: FunctionId) -> Self {
        let data = model.function(function);
        Self {
            model,
            resolver: Resolver::new(model, data.file),
            function,
            source_id: data.id.clone(),
            locals: FxHashMap::default(),
            edges: Vec::new(),
            seen: FxHashSet::default(),
        }
    }

    /// Receiver and parameters are in scope before any statement runs.
    fn seed_bindings(&mut self) {
        let data = self.model.function(self.function);
        if let (Some(receiver_var), Some(receiver)) =
            (data.receiver_var.as_ref(), data.receiver.as_ref())
        {
            if let Some(entity) = self.resolver.package_entity(receiver) {
                self.locals.insert(receiver_var.clone(), entity);
            }
        }
        for param in &data.params {
            if let Some(name) = &param.name {
                if let Some(entity) = self.resolver.resolve_type_entity(&param.type_expr) {
                    self.locals.insert(name.clone(), entity);
                }
            }
        }
    }

    fn emit(&mut self, target: FunctionId) {
        if !self.seen.insert(target) {
            return;
        }
        self.edges.push(Relation::new(
            RelationType::Call,
            self.source_id.clone(),
            self.model.function(target).id.clone(),
            1.0,
        ));
    }

    fn emit_method(&mut self, entity: Option<EntityId>, method: &str) -> bool {
        let target = entity.and_then(|e| self.model.entity(e).method_by_name(method));
        match target {
            Some(target) => {
                self.emit(target);
                true
            }
            None => false,
        }
    }

    // ── Statement traversal ──

    fn visit_block(&mut self, block: &Block) {
        for stmt in &block.stmts {
            self.visit_stmt(stmt);
        }
    }

    fn visit_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Expr(expr) => self.visit_expr(expr),
            Stmt::Assign { lhs, rhs, .. } => {
                // Bind first so children resolve against the new names.
                self.handle_assign(lhs, rhs);
                for expr in rhs {
                    self.visit_expr(expr);
                }
            }
            Stmt::VarDecl(specs) => {
                for spec in specs {
                    if let Some(type_expr) = &spec.type_expr {
                        if let Some(entity) = self.resolver.resolve_type_entity(type_expr) {
                            for name in &spec.names {
                                self.locals.insert(name.clone(), entity);
                            }
                        }
                    } else {
                        for (index, name) in spec.names.iter().enumerate() {
                            let value = spec.values.get(index).or_else(|| spec.values.first());
                            if let Some(entity) =
                                value.and_then(|v| self.binding_entity(v, index))
                            {
                                self.locals.insert(name.clone(), entity);
                            }
                        }
                    }
                    for value in &spec.values {
                        self.visit_expr(value);
                    }
                }
            }
            Stmt::Return(exprs) => {
                for expr in exprs {
                    self.visit_expr(expr);
                }
            }
            Stmt::If {
                init,
                cond,
                body,
                else_branch,
            } => {
                if let Some(init) = init {
                    self.visit_stmt(init);
                }
                if let Some(cond) = cond {
                    self.visit_expr(cond);
                }
                self.visit_block(body);
                if let Some(else_branch) = else_branch {
                    self.visit_stmt(else_branch);
                }
            }
            Stmt::For {
                init,
                cond,
                post,
                body,
            } => {
                if let Some(init) = init {
                    self.visit_stmt(init);
                }
                if let Some(cond) = cond {
                    self.visit_expr(cond);
                }
                if let Some(post) = post {
                    self.visit_stmt(post);
                }
                self.visit_block(body);
            }
            Stmt::Range { expr, body, .. } => {
                self.visit_expr(expr);
                self.visit_block(body);
            }
            Stmt::Block(block) => self.visit_block(block),
            // `go f()` and `defer f()` produce the same edge as a call.
            Stmt::Go(expr) | Stmt::Defer(expr) => self.visit_expr(expr),
            Stmt::Send { channel, value } => {
                self.visit_expr(channel);
                self.visit_expr(value);
            }
        }
    }

    // ── Expression traversal ──

    fn visit_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Call { callee, args } => {
                self.handle_call(callee);
                self.visit_expr(callee);
                for arg in args {
                    self.visit_expr(arg);
                }
            }
            Expr::Selector { operand, .. } => self.visit_expr(operand),
            Expr::Index { operand, index } => {
                self.visit_expr(operand);
                self.visit_expr(index);
            }
            Expr::TypeAssert { operand, .. } => self.visit_expr(operand),
            Expr::Unary { operand, .. } => self.visit_expr(operand),
            Expr::Paren(inner) => self.visit_expr(inner),
            Expr::Slice {
                operand,
                low,
                high,
                max,
            } => {
                self.visit_expr(operand);
                for bound in [low, high, max].into_iter().flatten() {
                    self.visit_expr(bound);
                }
            }
            Expr::Binary { left, right } => {
                self.visit_expr(left);
                self.visit_expr(right);
            }
            Expr::Composite { elems, .. } => {
                for elem in elems {
                    self.visit_expr(elem);
                }
            }
            // Calls inside closures belong to the enclosing function.
            Expr::FuncLit(block) => self.visit_block(block),
            Expr::Ident(_) | Expr::Literal => {}
        }
    }

    /// Resolve one callee expression and emit its edge.
    fn handle_call(&mut self, callee: &Expr) {
        match callee {
            Expr::Ident(name) => {
                if let Some(function) = self.resolver.package_function(name) {
                    self.emit(function);
                }
            }
            Expr::Selector { operand, field } => self.handle_selector_call(operand, field),
            Expr::Paren(inner) => self.handle_call(inner),
            _ => {}
        }
    }

    fn handle_selector_call(&mut self, operand: &Expr, method: &str) {
        match operand {
            Expr::Ident(name) => {
                // Local binding first; a bound name shadows import refs.
                if let Some(entity) = self.locals.get(name).copied() {
                    self.emit_method(Some(entity), method);
                    return;
                }
                if let Some(function) = self.resolver.function_for_import(name, method) {
                    self.emit(function);
                    return;
                }
                // Package-level variable: infer its type from the
                // declaration's value space.
                if let Some(entity) = self.resolver.package_entity(name) {
                    let receiver = if self.model.entity(entity).is_composite() {
                        Some(entity)
                    } else {
                        self.resolver.infer_variable_entity(entity)
                    };
                    self.emit_method(receiver, method);
                }
            }
            Expr::Selector {
                operand: inner_operand,
                field: inner_field,
            } => {
                let base = match self.resolve_entity_from_selector(inner_operand, inner_field) {
                    Some(base) => base,
                    None => return,
                };
                // A package variable resolved through the selector: use
                // its value space to find the receiver type.
                if !self.model.entity(base).is_composite() {
                    if let Some(receiver) = self.resolver.infer_variable_entity(base) {
                        if self.emit_method(Some(receiver), method) {
                            return;
                        }
                    }
                }
                // Field chain: x.Field.Method().
                if let Some(field_entity) = self.field_type_entity(base, inner_field) {
                    self.emit_method(Some(field_entity), method);
                }
            }
            Expr::Call { callee, .. } => {
                let entity = self.resolve_entity_from_call(callee);
                self.emit_method(entity, method);
            }
            Expr::Index { operand, .. } => {
                let entity = self.resolve_entity_from_expr(operand);
                self.emit_method(entity, method);
            }
            Expr::TypeAssert { ty, .. } => {
                let entity = self.resolver.resolve_type_entity(ty);
                self.emit_method(entity, method);
            }
            Expr::Unary { operand, .. } => {
                let entity = self.resolve_entity_from_expr(operand);
                self.emit_method(entity, method);
            }
            Expr::Paren(inner) => {
                let entity = self.resolve_entity_from_expr(inner);
                self.emit_method(entity, method);
            }
            _ => {}
        }
    }

    // ── Receiver resolution ──

    fn resolve_entity_from_expr(&self, expr: &Expr) -> Option<EntityId> {
        match expr {
            Expr::Ident(name) => self
                .locals
                .get(name)
                .copied()
                .or_else(|| self.resolver.package_entity(name)),
            Expr::Selector { operand, field } => self.resolve_entity_from_selector(operand, field),
            Expr::Unary { operand, .. } => self.resolve_entity_from_expr(operand),
            Expr::Paren(inner) => self.resolve_entity_from_expr(inner),
            Expr::Call { callee, .. } => self.resolve_entity_from_call(callee),
            Expr::TypeAssert { ty, .. } => self.resolver.resolve_type_entity(ty),
            Expr::Index { operand, .. } => self.resolve_entity_from_expr(operand),
            _ => None,
        }
    }

    /// Resolve the selector `operand.field` to an entity: an
    /// import-qualified symbol, a bound identifier, or a field chain.
    fn resolve_entity_from_selector(&self, operand: &Expr, field: &str) -> Option<EntityId> {
        match operand {
            Expr::Ident(name) => {
                if let Some(entity) = self.resolver.entity_for_import(name, field) {
                    return Some(entity);
                }
                self.locals
                    .get(name)
                    .copied()
                    .or_else(|| self.resolver.package_entity(name))
            }
            Expr::Selector {
                operand: inner_operand,
                field: inner_field,
            } => {
                let base = self.resolve_entity_from_selector(inner_operand, inner_field)?;
                match self.field_type_entity(base, inner_field) {
                    Some(field_entity) => Some(field_entity),
                    None => Some(base),
                }
            }
            Expr::Call { callee, .. } => self.resolve_entity_from_call(callee),
            Expr::Paren(inner) => self.resolve_entity_from_expr(inner),
            _ => None,
        }
    }

    /// Entity of a call's first result type, via the callee definition.
    fn resolve_entity_from_call(&self, callee: &Expr) -> Option<EntityId> {
        let function = self.resolve_callee_function(callee)?;
        self.resolver.function_result_entity(function, 0)
    }

    /// Resolve a callee expression to the function it names.
    fn resolve_callee_function(&self, callee: &Expr) -> Option<FunctionId> {
        match callee {
            Expr::Ident(name) => self.resolver.package_function(name),
            Expr::Selector { operand, field } => match operand.as_ref() {
                Expr::Ident(name) => {
                    if let Some(entity) = self.locals.get(name).copied() {
                        return self.model.entity(entity).method_by_name(field);
                    }
                    if let Some(function) = self.resolver.function_for_import(name, field) {
                        return Some(function);
                    }
                    let entity = self.resolver.package_entity(name)?;
                    let receiver = if self.model.entity(entity).is_composite() {
                        entity
                    } else {
                        self.resolver.infer_variable_entity(entity)?
                    };
                    self.model.entity(receiver).method_by_name(field)
                }
                Expr::Selector {
                    operand: inner_operand,
                    field: inner_field,
                } => {
                    let base = self.resolve_entity_from_selector(inner_operand, inner_field)?;
                    let field_entity = self.field_type_entity(base, inner_field)?;
                    self.model.entity(field_entity).method_by_name(field)
                }
                Expr::Call { callee: inner, .. } => {
                    let entity = self.resolve_entity_from_call(inner)?;
                    self.model.entity(entity).method_by_name(field)
                }
                _ => None,
            },
            Expr::Paren(inner) => self.resolve_callee_function(inner),
            _ => None,
        }
    }

    /// Declared type entity of a field, resolved in the owning file's
    /// import context first, the calling file's second.
    fn field_type_entity(&self, entity: EntityId, field_name: &str) -> Option<EntityId> {
        let data = self.model.entity(entity);
        let field = data.field_by_name(field_name)?;
        Resolver::new(self.model, data.file)
            .resolve_type_entity(&field.type_expr)
            .or_else(|| self.resolver.resolve_type_entity(&field.type_expr))
    }

    // ── Assignment bindings ──

    fn handle_assign(&mut self, lhs: &[Expr], rhs: &[Expr]) {
        for (index, target) in lhs.iter().enumerate() {
            let name = match target {
                Expr::Ident(name) if name != "_" => name.clone(),
                _ => continue,
            };
            let bound = if rhs.len() == lhs.len() {
                rhs.get(index).and_then(|value| self.binding_entity(value, 0))
            } else {
                rhs.first().and_then(|value| self.binding_entity(value, index))
            };
            if let Some(entity) = bound {
                self.locals.insert(name, entity);
            }
        }
    }

    /// Entity a binding value produces. For calls this is the declared
    /// type of the result at the chosen positional index.
    fn binding_entity(&self, value: &Expr, result_index: usize) -> Option<EntityId> {
        match value {
            Expr::Call { callee, .. } => {
                let function = self.resolve_callee_function(callee)?;
                self.resolver.function_result_entity(function, result_index)
            }
            Expr::Composite { ty: Some(ty), .. } => self.resolver.resolve_type_entity(ty),
            Expr::Unary {
                op: UnaryOp::Ref,
                operand,
            } => match operand.as_ref() {
                Expr::Composite { ty: Some(ty), .. } => self.resolver.resolve_type_entity(ty),
                inner => self.binding_entity(inner, result_index),
            },
            Expr::TypeAssert { ty, .. } => self.resolver.resolve_type_entity(ty),
            Expr::Ident(name) => self.locals.get(name).copied(),
            Expr::Paren(inner) => self.binding_entity(inner, result_index),
            _ => None,
        }
    }
}
