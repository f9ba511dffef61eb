//! Per-file relation analysis: declaration, ownership, inheritance and
//! call edges for everything one file declares.

use crate::calls;
use crate::model::{CodeModel, FileId};
use crate::resolve::Resolver;
use graph_store::{FunctionScope, Relation, RelationType};

/// All edges anchored at one file, in deterministic source order.
pub fn file_relations(model: &CodeModel, file: FileId) -> Vec<Relation> {
    let mut relations = Vec::new();
    let file_data = model.file(file);
    let file_id = file_data.id.as_str();
    let resolver = Resolver::new(model, file);

    for &entity_id in &file_data.entities {
        let entity = model.entity(entity_id);

        for field in &entity.fields {
            if let Some(target) = resolver.resolve_type_entity(&field.type_expr) {
                if target != entity_id {
                    relations.push(Relation::new(
                        RelationType::HasFields,
                        entity.id.clone(),
                        model.entity(target).id.clone(),
                        1.0,
                    ));
                }
            }
        }

        for &method in &entity.methods {
            let method_data = model.function(method);
            relations.push(Relation::new(
                RelationType::HasMethod,
                entity.id.clone(),
                method_data.id.clone(),
                1.0,
            ));
            // Interface methods are declared by the interface's file;
            // receiver methods get their declare edge from their own
            // file below.
            if method_data.scope == FunctionScope::Interface {
                relations.push(Relation::new(
                    RelationType::DeclareFunc,
                    file_id,
                    method_data.id.clone(),
                    1.0,
                ));
            }
        }

        for &parent in &entity.extends {
            relations.push(Relation::new(
                RelationType::Extends,
                entity.id.clone(),
                model.entity(parent).id.clone(),
                1.0,
            ));
        }

        relations.push(Relation::new(
            RelationType::DeclareEntity,
            file_id,
            entity.id.clone(),
            1.0,
        ));
    }

    for &function in &file_data.functions {
        relations.push(Relation::new(
            RelationType::DeclareFunc,
            file_id,
            model.function(function).id.clone(),
            1.0,
        ));
        relations.extend(calls::function_calls(model, function));
    }

    // Receiver methods declared in this file, attached or free.
    for &method in &file_data.methods {
        relations.push(Relation::new(
            RelationType::DeclareFunc,
            file_id,
            model.function(method).id.clone(),
            1.0,
        ));
        relations.extend(calls::function_calls(model, method));
    }

    // Local imports that resolve to a package in this repository.
    for import in &file_data.imports {
        if !import.is_local() {
            continue;
        }
        if let Some(package) = model.imported_package(file, &import.ref_name) {
            // Pruned packages never reach the store; don't point at them.
            if model.package(package).retained {
                relations.push(Relation::new(
                    RelationType::Import,
                    file_id,
                    model.package(package).id.clone(),
                    1.0,
                ));
            }
        }
    }

    relations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::build_model;

    fn keys_of(relations: &[Relation], relation_type: RelationType) -> Vec<String> {
        relations
            .iter()
            .filter(|r| r.relation_type == relation_type)
            .map(|r| r.union_key())
            .collect()
    }

    #[test]
    fn structure_with_method_yields_declare_and_has_method() {
        let model = build_model(
            None,
            &[(
                "",
                "file.go",
                r#"package app

type S struct {
    x int
}

func (s *S) M() {}
"#,
            )],
        );
        let file = model.file_ids().next().unwrap();
        let relations = file_relations(&model, file);

        assert_eq!(
            keys_of(&relations, RelationType::DeclareEntity),
            vec!["repo@app@file.go#DeclareEntity#repo@app@file.go:S"]
        );
        assert_eq!(
            keys_of(&relations, RelationType::DeclareFunc),
            vec!["repo@app@file.go#DeclareFunc#repo@app:S.M"]
        );
        assert_eq!(
            keys_of(&relations, RelationType::HasMethod),
            vec!["repo@app@file.go:S#HasMethod#repo@app:S.M"]
        );
    }

    #[test]
    fn field_of_entity_type_yields_has_fields() {
        let model = build_model(
            None,
            &[(
                "",
                "fields.go",
                r#"package app

type Inner struct{}

type Outer struct {
    inner *Inner
    count int
}
"#,
            )],
        );
        let file = model.file_ids().next().unwrap();
        let relations = file_relations(&model, file);
        assert_eq!(
            keys_of(&relations, RelationType::HasFields),
            vec!["repo@app@fields.go:Outer#HasFields#repo@app@fields.go:Inner"]
        );
    }

    #[test]
    fn extends_edges_follow_classification() {
        let model = build_model(
            None,
            &[(
                "",
                "embed.go",
                r#"package app

type Base struct{}

type Child struct {
    Base
}
"#,
            )],
        );
        let file = model.file_ids().next().unwrap();
        let relations = file_relations(&model, file);
        assert_eq!(
            keys_of(&relations, RelationType::Extends),
            vec!["repo@app@embed.go:Child#Extends#repo@app@embed.go:Base"]
        );
    }

    #[test]
    fn local_imports_emit_import_edges() {
        let model = build_model(
            Some("example.com/app"),
            &[
                ("core", "core.go", "package core\n\ntype T struct{}\n"),
                (
                    "",
                    "main.go",
                    r#"package app

import (
    "fmt"
    "example.com/app/core"
)

type Holder struct {
    t core.T
}

func init() { fmt.Println() }
"#,
                ),
            ],
        );
        let file = model
            .file_ids()
            .find(|f| model.file(*f).name == "main.go")
            .unwrap();
        let relations = file_relations(&model, file);
        assert_eq!(
            keys_of(&relations, RelationType::Import),
            vec!["repo@app@main.go#Import#repo@app@core"]
        );
    }
}
