//! Classification: resolve embedded types into explicit inheritance
//! links, then attach methods to their receiver entities.
//!
//! Both passes collect their resolutions against an immutable model and
//! apply them in one step, so readers never observe a half-classified
//! entity.

use crate::model::{CodeModel, EntityId, FileId, FunctionId, PackageId};
use graph_store::FunctionScope;
use parser_core::ast::TypeExpr;
use tracing::info;

pub fn classify(model: &mut CodeModel) {
    classify_extends(model);
    classify_methods(model);
}

/// Resolve `raw_extends` expressions into `extends` links. Lookup
/// failures are dropped silently; shapes the resolver does not know are
/// logged and dropped.
fn classify_extends(model: &mut CodeModel) {
    let mut resolved: Vec<(EntityId, Vec<EntityId>)> = Vec::new();

    for entity_id in model.entity_ids() {
        let entity = model.entity(entity_id);
        if entity.raw_extends.is_empty() {
            continue;
        }
        let mut targets = Vec::new();
        for raw in &entity.raw_extends {
            if let Some(target) = resolve_embedded(model, entity.package, entity.file, raw) {
                targets.push(target);
            }
        }
        if !targets.is_empty() {
            resolved.push((entity_id, targets));
        }
    }

    for (entity_id, targets) in resolved {
        model.entity_mut(entity_id).extends = targets;
    }
}

fn resolve_embedded(
    model: &CodeModel,
    package: PackageId,
    file: FileId,
    expr: &TypeExpr,
) -> Option<EntityId> {
    match expr {
        TypeExpr::Ident(name) => model.entity_in_package(package, name),
        TypeExpr::Qualified { package: ref_name, name } => {
            model.entity_for_import(file, ref_name, name)
        }
        TypeExpr::Pointer(inner) => resolve_embedded(model, package, file, inner),
        TypeExpr::Generic { base, .. } => resolve_embedded(model, package, file, base),
        other => {
            info!(expr = ?other, "unrecognized embedded type shape, dropping");
            None
        }
    }
}

/// Attach buffered methods to the entity their receiver names. Methods
/// whose receiver does not resolve stay on the file as free methods.
fn classify_methods(model: &mut CodeModel) {
    let mut attach: Vec<(FunctionId, EntityId)> = Vec::new();

    for function_id in model.function_ids() {
        let function = model.function(function_id);
        if function.scope != FunctionScope::Method || function.owner.is_some() {
            continue;
        }
        let receiver = match function.receiver.as_deref() {
            Some(receiver) => receiver,
            None => continue,
        };
        if let Some(entity_id) = model.entity_in_package(function.package, receiver) {
            if model.entity(entity_id).is_composite() {
                attach.push((function_id, entity_id));
            }
        }
    }

    for (function_id, entity_id) in attach {
        let name = model.function(function_id).name.clone();
        if model.entity_mut(entity_id).add_method(&name, function_id) {
            model.function_mut(function_id).owner = Some(entity_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::build_model;

    #[test]
    fn methods_attach_to_receiver_entities() {
        let model = build_model(
            None,
            &[(
                "",
                "server.go",
                r#"package app

type Server struct{}

func (s *Server) Start() {}

func (u *Unknown) Orphan() {}
"#,
            )],
        );

        let root = model.root().unwrap();
        let server = model.entity_in_package(root, "Server").unwrap();
        let entity = model.entity(server);
        assert_eq!(entity.methods.len(), 1);
        let method = model.function(entity.methods[0]);
        assert_eq!(method.name, "Start");
        assert_eq!(method.owner, Some(server));
        assert_eq!(method.id, "repo@app:Server.Start");

        // The orphan stays as a free method on the file.
        let file = model.file(entity.file);
        let free: Vec<_> = file
            .methods
            .iter()
            .filter(|f| model.function(**f).owner.is_none())
            .collect();
        assert_eq!(free.len(), 1);
    }

    #[test]
    fn same_package_embeds_resolve() {
        let model = build_model(
            None,
            &[(
                "",
                "types.go",
                r#"package app

type Base struct{}

type Child struct {
    Base
    name string
}

type PtrChild struct {
    *Base
}
"#,
            )],
        );

        let root = model.root().unwrap();
        let base = model.entity_in_package(root, "Base").unwrap();
        let child = model.entity_in_package(root, "Child").unwrap();
        let ptr_child = model.entity_in_package(root, "PtrChild").unwrap();
        assert_eq!(model.entity(child).extends, vec![base]);
        assert_eq!(model.entity(ptr_child).extends, vec![base]);
    }

    #[test]
    fn cross_package_embeds_follow_local_imports() {
        let model = build_model(
            Some("example.com/app"),
            &[
                (
                    "core",
                    "base.go",
                    r#"package core

type Base struct{}
"#,
                ),
                (
                    "api",
                    "child.go",
                    r#"package api

import "example.com/app/core"

type Child struct {
    core.Base
}
"#,
                ),
            ],
        );

        let api = model.package_by_key("repo@app@api").unwrap();
        let core = model.package_by_key("repo@app@core").unwrap();
        let child = model.entity_in_package(api, "Child").unwrap();
        let base = model.entity_in_package(core, "Base").unwrap();
        assert_eq!(model.entity(child).extends, vec![base]);
    }

    #[test]
    fn interface_embedding_resolves() {
        let model = build_model(
            None,
            &[(
                "",
                "io.go",
                r#"package app

type Reader interface {
    Read() error
}

type ReadCloser interface {
    Reader
    Close() error
}
"#,
            )],
        );

        let root = model.root().unwrap();
        let reader = model.entity_in_package(root, "Reader").unwrap();
        let read_closer = model.entity_in_package(root, "ReadCloser").unwrap();
        assert_eq!(model.entity(read_closer).extends, vec![reader]);
    }

    #[test]
    fn unresolved_embeds_are_dropped() {
        let model = build_model(
            None,
            &[(
                "",
                "ext.go",
                r#"package app

import "sync"

type Guarded struct {
    sync.Mutex
}
"#,
            )],
        );

        let root = model.root().unwrap();
        let guarded = model.entity_in_package(root, "Guarded").unwrap();
        assert!(model.entity(guarded).extends.is_empty());
    }
}
