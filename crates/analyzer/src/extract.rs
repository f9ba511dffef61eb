//! Per-file symbol extraction: walks the lowered syntax tree once, in
//! declaration order, and populates the model.

use crate::model::types::{EntityData, FieldData, FunctionData, ImportData, ParamData, ValueSpecData};
use crate::model::{CodeModel, FileId, PackageId};
use graph_store::{EntityKind, FunctionScope};
use parser_core::ast::{Decl, FuncDecl, GoFile, ParamDecl, TypeDecl, TypeDeclKind, ValueDecl, ValueKind};

/// Extract all symbols of one parsed file into the model.
pub fn extract_file(model: &mut CodeModel, package: PackageId, file: FileId, parsed: GoFile) {
    for import in &parsed.imports {
        add_import(model, file, import.alias.clone(), &import.path);
    }
    for decl in parsed.decls {
        match decl {
            Decl::Type(type_decl) => extract_type(model, package, file, type_decl),
            Decl::Value(value_decl) => extract_value(model, package, file, value_decl),
            Decl::Func(func_decl) => extract_func(model, package, file, func_decl),
        }
    }
}

fn add_import(model: &mut CodeModel, file: FileId, alias: Option<String>, path: &str) {
    let ref_name = alias.unwrap_or_else(|| {
        path.rsplit('/').next().unwrap_or(path).to_string()
    });
    let local_path = model
        .module
        .as_deref()
        .filter(|module| !module.is_empty())
        .and_then(|module| path.strip_prefix(module))
        .map(str::to_string);

    let file_data = model.file_mut(file);
    let import = ImportData {
        ref_name: ref_name.clone(),
        path: path.to_string(),
        local_path,
        file_id: file_data.id.clone(),
    };
    let index = file_data.imports.len();
    let is_local = import.is_local();
    file_data.imports.push(import);
    if is_local {
        file_data.local_imports.insert(ref_name, index);
    }
}

fn extract_type(model: &mut CodeModel, package: PackageId, file: FileId, decl: TypeDecl) {
    let file_id = model.file(file).id.clone();
    let entity_id = format!("{file_id}:{}", decl.name);

    match decl.kind {
        TypeDeclKind::Struct { fields } => {
            let mut entity = EntityData::new(
                entity_id.clone(),
                decl.name,
                EntityKind::Structure,
                file,
                package,
                decl.doc,
            );
            for field in fields {
                if field.name.is_none() {
                    entity.raw_extends.push(field.type_expr.clone());
                }
                entity.add_field(FieldData {
                    name: field.name.unwrap_or_default(),
                    type_expr: field.type_expr,
                    type_string: field.type_string,
                    document: field.doc,
                });
            }
            model.add_entity(entity);
        }
        TypeDeclKind::Interface { methods, embedded } => {
            let mut entity = EntityData::new(
                entity_id.clone(),
                decl.name.clone(),
                EntityKind::Interface,
                file,
                package,
                decl.doc,
            );
            entity.raw_extends = embedded;
            let entity_ref = model.add_entity(entity);

            for method in methods {
                let method_name = method.name.clone();
                let function = model.add_function(FunctionData {
                    id: format!("{entity_id}:{}.{}", decl.name, method.name),
                    name: method.name.clone(),
                    package,
                    file,
                    owner: Some(entity_ref),
                    scope: FunctionScope::Interface,
                    receiver: None,
                    receiver_var: None,
                    params: params(method.params),
                    results: params(method.results),
                    body: None,
                    start_byte: 0,
                    end_byte: 0,
                    document: method.doc,
                });
                model.entity_mut(entity_ref).add_method(&method_name, function);
            }
        }
    }
}

fn extract_value(model: &mut CodeModel, package: PackageId, file: FileId, decl: ValueDecl) {
    let kind = match decl.kind {
        ValueKind::Const => EntityKind::Constant,
        ValueKind::Var => EntityKind::Variable,
    };
    let file_id = model.file(file).id.clone();
    for name in &decl.names {
        let mut entity = EntityData::new(
            format!("{file_id}:{name}"),
            name.clone(),
            kind,
            file,
            package,
            decl.doc.clone(),
        );
        entity.value_spec = Some(ValueSpecData {
            type_expr: decl.type_expr.clone(),
            values: decl.values.clone(),
        });
        model.add_entity(entity);
    }
}

fn extract_func(model: &mut CodeModel, package: PackageId, file: FileId, decl: FuncDecl) {
    let package_id = model.package(package).id.clone();

    match decl.receiver {
        Some(receiver) => {
            let function = model.add_function(FunctionData {
                id: format!("{package_id}:{}.{}", receiver.type_name, decl.name),
                name: decl.name,
                package,
                file,
                owner: None,
                scope: FunctionScope::Method,
                receiver: Some(receiver.type_name),
                receiver_var: receiver.name,
                params: params(decl.params),
                results: params(decl.results),
                body: decl.body,
                start_byte: decl.range.start,
                end_byte: decl.range.end,
                document: decl.doc,
            });
            model.file_mut(file).methods.push(function);
        }
        None => {
            let name = decl.name.clone();
            let function = model.add_function(FunctionData {
                id: format!("{package_id}:{}", decl.name),
                name: decl.name,
                package,
                file,
                owner: None,
                scope: FunctionScope::Top,
                receiver: None,
                receiver_var: None,
                params: params(decl.params),
                results: params(decl.results),
                body: decl.body,
                start_byte: decl.range.start,
                end_byte: decl.range.end,
                document: decl.doc,
            });
            model.file_mut(file).functions.push(function);
            model
                .package_mut(package)
                .function_names
                .entry(name)
                .or_insert(function);
        }
    }
}

fn params(decls: Vec<ParamDecl>) -> Vec<ParamData> {
    decls
        .into_iter()
        .map(|p| ParamData {
            name: p.name,
            type_expr: p.type_expr,
            type_string: p.type_string,
        })
        .collect()
}
