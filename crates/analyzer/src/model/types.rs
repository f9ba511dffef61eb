//! Arena payloads: packages, files, entities, fields and functions as
//! stored in the in-memory model.

use super::{EntityId, FileId, FunctionId, PackageId};
use graph_store::{EntityKind, FunctionScope};
use parser_core::ast::{Expr, TypeExpr};
use rustc_hash::FxHashMap;
use std::path::PathBuf;

/// A directory that maps onto a package node.
#[derive(Debug)]
pub struct PackageData {
    pub id: String,
    pub name: String,
    pub parent: Option<PackageId>,
    pub path: PathBuf,
    pub subpackages: Vec<PackageId>,
    pub files: Vec<FileId>,
    /// Entity name → entity, first declaration wins.
    pub entity_names: FxHashMap<String, EntityId>,
    /// Top-level function name → function, first declaration wins.
    pub function_names: FxHashMap<String, FunctionId>,
    /// Set after discovery: a package survives only if it transitively
    /// contains at least one entity or top-level function.
    pub retained: bool,
}

#[derive(Debug)]
pub struct FileData {
    pub id: String,
    pub name: String,
    pub package: PackageId,
    pub path: PathBuf,
    pub imports: Vec<ImportData>,
    /// Ref name → index into `imports`, local imports only.
    pub local_imports: FxHashMap<String, usize>,
    pub entities: Vec<EntityId>,
    /// Top-level functions declared in this file.
    pub functions: Vec<FunctionId>,
    /// Methods declared in this file; attached to entities during
    /// classification, unresolved receivers stay here as free methods.
    pub methods: Vec<FunctionId>,
}

#[derive(Debug, Clone)]
pub struct ImportData {
    /// Explicit alias if present, else the last path segment.
    pub ref_name: String,
    pub path: String,
    /// For imports under the repository module: the path with the
    /// module prefix stripped. The resolver keys package lookups on it.
    pub local_path: Option<String>,
    pub file_id: String,
}

impl ImportData {
    pub fn is_local(&self) -> bool {
        self.local_path.is_some()
    }
}

#[derive(Debug)]
pub struct EntityData {
    pub id: String,
    pub name: String,
    pub kind: EntityKind,
    pub file: FileId,
    pub package: PackageId,
    pub document: String,
    pub fields: Vec<FieldData>,
    field_names: FxHashMap<String, usize>,
    pub methods: Vec<FunctionId>,
    method_names: FxHashMap<String, FunctionId>,
    /// Resolved by the classification pass.
    pub extends: Vec<EntityId>,
    /// Unresolved embedded-type expressions, consumed by classification.
    pub raw_extends: Vec<TypeExpr>,
    /// Initializer of constants and variables, used for type inference.
    pub value_spec: Option<ValueSpecData>,
}

impl EntityData {
    pub fn new(
        id: String,
        name: String,
        kind: EntityKind,
        file: FileId,
        package: PackageId,
        document: String,
    ) -> Self {
        Self {
            id,
            name,
            kind,
            file,
            package,
            document,
            fields: Vec::new(),
            field_names: FxHashMap::default(),
            methods: Vec::new(),
            method_names: FxHashMap::default(),
            extends: Vec::new(),
            raw_extends: Vec::new(),
            value_spec: None,
        }
    }

    pub fn is_composite(&self) -> bool {
        matches!(self.kind, EntityKind::Structure | EntityKind::Interface)
    }

    pub fn add_field(&mut self, field: FieldData) {
        if !self.is_composite() {
            return;
        }
        if !field.name.is_empty() {
            self.field_names
                .entry(field.name.clone())
                .or_insert(self.fields.len());
        }
        self.fields.push(field);
    }

    pub fn field_by_name(&self, name: &str) -> Option<&FieldData> {
        self.field_names.get(name).map(|index| &self.fields[*index])
    }

    /// First declaration of a method name wins, duplicates are dropped.
    /// Returns whether the method was attached.
    pub fn add_method(&mut self, name: &str, function: FunctionId) -> bool {
        if !self.is_composite() || self.method_names.contains_key(name) {
            return false;
        }
        self.method_names.insert(name.to_string(), function);
        self.methods.push(function);
        true
    }

    pub fn method_by_name(&self, name: &str) -> Option<FunctionId> {
        self.method_names.get(name).copied()
    }
}

#[derive(Debug, Clone)]
pub struct FieldData {
    /// Empty for embedded fields; the type names them.
    pub name: String,
    pub type_expr: TypeExpr,
    pub type_string: String,
    pub document: String,
}

/// Initializer of a package-level constant or variable.
#[derive(Debug, Clone)]
pub struct ValueSpecData {
    pub type_expr: Option<TypeExpr>,
    pub values: Vec<Expr>,
}

#[derive(Debug, Clone)]
pub struct ParamData {
    pub name: Option<String>,
    pub type_expr: TypeExpr,
    pub type_string: String,
}

#[derive(Debug)]
pub struct FunctionData {
    pub id: String,
    pub name: String,
    pub package: PackageId,
    pub file: FileId,
    /// Owning entity for attached methods and interface methods.
    pub owner: Option<EntityId>,
    pub scope: FunctionScope,
    /// Receiver type name for methods.
    pub receiver: Option<String>,
    /// Receiver variable name, seeded into the call visitor's bindings.
    pub receiver_var: Option<String>,
    pub params: Vec<ParamData>,
    pub results: Vec<ParamData>,
    pub body: Option<parser_core::ast::Block>,
    /// Half-open byte offsets of the declaration in its file.
    pub start_byte: usize,
    pub end_byte: usize,
    pub document: String,
}
