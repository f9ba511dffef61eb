//! Name resolution against the classified model.
//!
//! Resolution order for ambiguous names: local scope (owned by the call
//! visitor) → file scope → package scope → import-qualified foreign
//! package. The first hit wins; failures are `None`, never errors.

use crate::model::{CodeModel, EntityId, FileId, FunctionId, PackageId};
use parser_core::ast::{Expr, TypeExpr, UnaryOp};

/// Resolves identifiers and selectors in the context of one file.
pub struct Resolver<'m> {
    model: &'m CodeModel,
    file: FileId,
    package: PackageId,
}

impl<'m> Resolver<'m> {
    pub fn new(model: &'m CodeModel, file: FileId) -> Self {
        let package = model.file(file).package;
        Self {
            model,
            file,
            package,
        }
    }

    pub fn model(&self) -> &'m CodeModel {
        self.model
    }

    pub fn package(&self) -> PackageId {
        self.package
    }

    // ── Q1: type expression → entity ──

    /// Strip pointer, slice, array, map-value, channel and generic
    /// layers, then resolve the base form.
    pub fn resolve_type_entity(&self, expr: &TypeExpr) -> Option<EntityId> {
        match expr {
            TypeExpr::Ident(name) => self.package_entity(name),
            TypeExpr::Qualified { package, name } => self.entity_for_import(package, name),
            TypeExpr::Pointer(inner) | TypeExpr::Slice(inner) | TypeExpr::Chan(inner) => {
                self.resolve_type_entity(inner)
            }
            TypeExpr::Map { value, .. } => self.resolve_type_entity(value),
            TypeExpr::Generic { base, .. } => self.resolve_type_entity(base),
            TypeExpr::Func | TypeExpr::Other(_) => None,
        }
    }

    // ── Scoped lookups ──

    pub fn package_entity(&self, name: &str) -> Option<EntityId> {
        self.model.entity_in_package(self.package, name)
    }

    pub fn package_function(&self, name: &str) -> Option<FunctionId> {
        self.model.function_in_package(self.package, name)
    }

    pub fn entity_for_import(&self, ref_name: &str, name: &str) -> Option<EntityId> {
        self.model.entity_for_import(self.file, ref_name, name)
    }

    pub fn function_for_import(&self, ref_name: &str, name: &str) -> Option<FunctionId> {
        self.model.function_for_import(self.file, ref_name, name)
    }

    // ── Value-space inference ──

    /// Infer the runtime type entity of a package-level constant or
    /// variable from its declaration: explicit type first, then the
    /// initializer.
    pub fn infer_variable_entity(&self, entity: EntityId) -> Option<EntityId> {
        let data = self.model.entity(entity);
        let spec = data.value_spec.as_ref()?;
        let resolver = Resolver::new(self.model, data.file);
        if let Some(type_expr) = &spec.type_expr {
            return resolver.resolve_type_entity(type_expr);
        }
        let value = spec.values.first()?;
        resolver.resolve_initializer(value)
    }

    /// Entity of the type an initializer expression produces.
    pub fn resolve_initializer(&self, expr: &Expr) -> Option<EntityId> {
        match expr {
            Expr::Call { callee, .. } => {
                let function = self.resolve_simple_callee(callee)?;
                self.function_result_entity(function, 0)
            }
            Expr::Composite { ty: Some(ty), .. } => self.resolve_type_entity(ty),
            Expr::Unary {
                op: UnaryOp::Ref,
                operand,
            } => match operand.as_ref() {
                Expr::Composite { ty: Some(ty), .. } => self.resolve_type_entity(ty),
                inner => self.resolve_initializer(inner),
            },
            Expr::Ident(name) => self.package_entity(name),
            Expr::Selector { operand, field } => match operand.as_ref() {
                Expr::Ident(ref_name) => self.entity_for_import(ref_name, field),
                _ => None,
            },
            Expr::Paren(inner) => self.resolve_initializer(inner),
            _ => None,
        }
    }

    /// Callee forms resolvable without local bindings: a package-local
    /// function or an import-qualified function.
    pub fn resolve_simple_callee(&self, callee: &Expr) -> Option<FunctionId> {
        match callee {
            Expr::Ident(name) => self.package_function(name),
            Expr::Selector { operand, field } => match operand.as_ref() {
                Expr::Ident(ref_name) => self.function_for_import(ref_name, field),
                _ => None,
            },
            Expr::Paren(inner) => self.resolve_simple_callee(inner),
            _ => None,
        }
    }

    /// Entity of a function's result type at the given positional
    /// index, resolved in the callee's own file context.
    pub fn function_result_entity(&self, function: FunctionId, index: usize) -> Option<EntityId> {
        let data = self.model.function(function);
        let result = data.results.get(index)?;
        Resolver::new(self.model, data.file).resolve_type_entity(&result.type_expr)
    }
}
