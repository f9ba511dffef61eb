//! Interface-implementation matching by structural method-set
//! comparison.
//!
//! A structure implements an interface when its method set — its own
//! methods plus everything inherited through `Extends` — covers the
//! interface's method set by name and signature. Signature equivalence
//! compares parameter and result arity plus normalized type strings,
//! where normalization strips prefixes matching the compared file's
//! import refs, first matching import in declaration order first.

use crate::model::types::ImportData;
use crate::model::{CodeModel, EntityId, FunctionId};
use graph_store::{EntityKind, Relation, RelationType};
use rustc_hash::{FxHashMap, FxHashSet};

/// `Implement` edges for every interface/structure pair that matches.
/// Runs only after classification has attached methods and extends.
pub fn match_implementations(model: &CodeModel) -> Vec<Relation> {
    let mut relations = Vec::new();
    let mut structure_sets: FxHashMap<EntityId, FxHashMap<String, FunctionId>> =
        FxHashMap::default();

    let structures: Vec<EntityId> = model
        .entity_ids()
        .filter(|e| model.entity(*e).kind == EntityKind::Structure)
        .collect();

    for interface in model.entity_ids() {
        if model.entity(interface).kind != EntityKind::Interface {
            continue;
        }
        let required = method_set(model, interface);
        if required.is_empty() {
            continue;
        }
        for structure in &structures {
            let methods = structure_sets
                .entry(*structure)
                .or_insert_with(|| method_set(model, *structure));
            if covers(model, methods, &required) {
                relations.push(Relation::new(
                    RelationType::Implement,
                    model.entity(*structure).id.clone(),
                    model.entity(interface).id.clone(),
                    0.0,
                ));
            }
        }
    }
    relations
}

/// Whether one structure implements one interface.
pub fn is_impl_interface(model: &CodeModel, structure: EntityId, interface: EntityId) -> bool {
    if model.entity(structure).kind != EntityKind::Structure
        || model.entity(interface).kind != EntityKind::Interface
    {
        return false;
    }
    let required = method_set(model, interface);
    if required.is_empty() {
        return false;
    }
    let methods = method_set(model, structure);
    covers(model, &methods, &required)
}

/// Transitive method set of an entity: own methods first, then
/// inherited ones, never overriding a name already present.
fn method_set(model: &CodeModel, entity: EntityId) -> FxHashMap<String, FunctionId> {
    let mut methods = FxHashMap::default();
    let mut visited = FxHashSet::default();
    collect_methods(model, entity, &mut methods, &mut visited);
    methods
}

fn collect_methods(
    model: &CodeModel,
    entity: EntityId,
    methods: &mut FxHashMap<String, FunctionId>,
    visited: &mut FxHashSet<EntityId>,
) {
    if !visited.insert(entity) {
        return;
    }
    let data = model.entity(entity);
    for method in &data.methods {
        let name = &model.function(*method).name;
        methods.entry(name.clone()).or_insert(*method);
    }
    for parent in &data.extends {
        collect_methods(model, *parent, methods, visited);
    }
}

fn covers(
    model: &CodeModel,
    methods: &FxHashMap<String, FunctionId>,
    required: &FxHashMap<String, FunctionId>,
) -> bool {
    if methods.len() < required.len() {
        return false;
    }
    for (name, want) in required {
        match methods.get(name) {
            Some(have) if signatures_match(model, *have, *want) => {}
            _ => return false,
        }
    }
    true
}

/// Signature equivalence: same parameter and result arity, and each
/// positional pair's normalized type strings compare equal.
pub fn signatures_match(model: &CodeModel, left: FunctionId, right: FunctionId) -> bool {
    let left_data = model.function(left);
    let right_data = model.function(right);
    if left_data.params.len() != right_data.params.len()
        || left_data.results.len() != right_data.results.len()
    {
        return false;
    }
    let left_imports = &model.file(left_data.file).imports;
    let right_imports = &model.file(right_data.file).imports;

    let pairs = left_data
        .params
        .iter()
        .zip(&right_data.params)
        .chain(left_data.results.iter().zip(&right_data.results));
    for (left_param, right_param) in pairs {
        let left_type = normalize_type(&left_param.type_string, left_imports);
        let right_type = normalize_type(&right_param.type_string, right_imports);
        if left_type != right_type {
            return false;
        }
    }
    true
}

/// Strip each import ref's `ref.` prefix once, in declaration order.
/// Duplicate ref names keep the earlier import's precedence.
fn normalize_type(type_string: &str, imports: &[ImportData]) -> String {
    let mut normalized = type_string.to_string();
    for import in imports {
        let prefix = format!("{}.", import.ref_name);
        if let Some(position) = normalized.find(&prefix) {
            normalized.replace_range(position..position + prefix.len(), "");
        }
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::build_model;

    fn entity(model: &CodeModel, key: &str, name: &str) -> EntityId {
        let package = model.package_by_key(key).unwrap();
        model.entity_in_package(package, name).unwrap()
    }

    #[test]
    fn matching_method_set_implements() {
        let model = build_model(
            None,
            &[(
                "",
                "io.go",
                r#"package app

type Doer interface {
    Do() error
}

type Worker struct{}

func (w *Worker) Do() error { return nil }

type Idle struct{}
"#,
            )],
        );

        let worker = entity(&model, "repo@app", "Worker");
        let idle = entity(&model, "repo@app", "Idle");
        let doer = entity(&model, "repo@app", "Doer");
        assert!(is_impl_interface(&model, worker, doer));
        assert!(!is_impl_interface(&model, idle, doer));

        let relations = match_implementations(&model);
        assert_eq!(relations.len(), 1);
        assert_eq!(relations[0].source_id, model.entity(worker).id);
        assert_eq!(relations[0].target_id, model.entity(doer).id);
    }

    #[test]
    fn signature_mismatch_rejects() {
        let model = build_model(
            None,
            &[(
                "",
                "sig.go",
                r#"package app

type Doer interface {
    Do(count int) error
}

type WrongArity struct{}

func (w *WrongArity) Do() error { return nil }

type WrongType struct{}

func (w *WrongType) Do(count string) error { return nil }
"#,
            )],
        );

        let doer = entity(&model, "repo@app", "Doer");
        assert!(!is_impl_interface(
            &model,
            entity(&model, "repo@app", "WrongArity"),
            doer
        ));
        assert!(!is_impl_interface(
            &model,
            entity(&model, "repo@app", "WrongType"),
            doer
        ));
    }

    #[test]
    fn embedded_methods_count_transitively() {
        let model = build_model(
            None,
            &[(
                "",
                "embed.go",
                r#"package app

type Runner interface {
    Run()
}

type Base struct{}

func (b Base) Run() {}

type Middle struct {
    Base
}

type Child struct {
    Middle
}
"#,
            )],
        );

        let runner = entity(&model, "repo@app", "Runner");
        // Method set of Child includes methods(Middle) ∪ methods(Base).
        assert!(is_impl_interface(
            &model,
            entity(&model, "repo@app", "Child"),
            runner
        ));
    }

    #[test]
    fn interface_embedding_extends_requirements() {
        let model = build_model(
            None,
            &[(
                "",
                "iface.go",
                r#"package app

type Reader interface {
    Read() error
}

type ReadCloser interface {
    Reader
    Close() error
}

type OnlyClose struct{}

func (o *OnlyClose) Close() error { return nil }

type Full struct{}

func (f *Full) Read() error { return nil }

func (f *Full) Close() error { return nil }
"#,
            )],
        );

        let read_closer = entity(&model, "repo@app", "ReadCloser");
        assert!(!is_impl_interface(
            &model,
            entity(&model, "repo@app", "OnlyClose"),
            read_closer
        ));
        assert!(is_impl_interface(
            &model,
            entity(&model, "repo@app", "Full"),
            read_closer
        ));
    }

    #[test]
    fn normalization_bridges_import_prefixes() {
        // The interface names the type as core.Item (imported); the
        // implementation lives in package core and writes plain Item.
        let model = build_model(
            Some("example.com/app"),
            &[
                (
                    "core",
                    "item.go",
                    r#"package core

type Item struct{}

type Store struct{}

func (s *Store) Get(id string) *Item { return nil }
"#,
                ),
                (
                    "api",
                    "iface.go",
                    r#"package api

import "example.com/app/core"

type Getter interface {
    Get(id string) *core.Item
}
"#,
                ),
            ],
        );

        assert!(is_impl_interface(
            &model,
            entity(&model, "repo@app@core", "Store"),
            entity(&model, "repo@app@api", "Getter")
        ));
    }

    #[test]
    fn signature_equivalence_is_reflexive_and_symmetric() {
        let model = build_model(
            None,
            &[(
                "",
                "sym.go",
                r#"package app

type A struct{}

func (a *A) Do(x int) error { return nil }

type B struct{}

func (b *B) Do(x int) error { return nil }
"#,
            )],
        );
        let a = entity(&model, "repo@app", "A");
        let b = entity(&model, "repo@app", "B");
        let do_a = model.entity(a).method_by_name("Do").unwrap();
        let do_b = model.entity(b).method_by_name("Do").unwrap();

        assert!(signatures_match(&model, do_a, do_a));
        assert_eq!(
            signatures_match(&model, do_a, do_b),
            signatures_match(&model, do_b, do_a)
        );
        assert!(signatures_match(&model, do_a, do_b));
    }

    #[test]
    fn empty_interfaces_never_match() {
        let model = build_model(
            None,
            &[(
                "",
                "empty.go",
                r#"package app

type Any interface{}

type Thing struct{}
"#,
            )],
        );
        assert!(match_implementations(&model).is_empty());
    }
}
