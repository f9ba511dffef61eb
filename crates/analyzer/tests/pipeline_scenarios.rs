//! End-to-end pipeline scenarios against the in-memory graph store.

use analyzer::chunk::Indexer;
use analyzer::implement;
use analyzer::model::repository::CodeRepository;
use analyzer::{AnalysisConfig, AnalyzerError, CodeAnalyzer};
use graph_store::memory::{MemoryGraphStore, MemoryVectorStore};
use graph_store::testing::StaticEmbeddingClient;
use graph_store::{GraphStore, RelationType, VectorStore};
use tokio_util::sync::CancellationToken;

fn write_repo(files: &[(&str, &str)]) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    for (path, content) in files {
        let full = dir.path().join(path);
        std::fs::create_dir_all(full.parent().unwrap()).unwrap();
        std::fs::write(full, content).unwrap();
    }
    dir
}

fn repo_at(dir: &tempfile::TempDir) -> CodeRepository {
    CodeRepository::new("repo1", "demo", dir.path())
}

fn analyze(repo: &CodeRepository, store: &MemoryGraphStore) -> analyzer::CodeModel {
    let analyzer = CodeAnalyzer::new(AnalysisConfig::default());
    let (model, _report) = analyzer
        .analyze(repo, store, &CancellationToken::new())
        .expect("analysis should succeed");
    model
}

fn relation_keys(store: &MemoryGraphStore, relation_type: RelationType) -> Vec<String> {
    store
        .relations_of(relation_type)
        .into_iter()
        .map(|r| r.union_key())
        .collect()
}

/// A tempdir whose final path component is stable, so graph IDs are
/// predictable in assertions.
fn named_root(files: &[(&str, &str)]) -> (tempfile::TempDir, CodeRepository) {
    let outer = tempfile::tempdir().unwrap();
    let root = outer.path().join("demo");
    for (path, content) in files {
        let full = root.join(path);
        std::fs::create_dir_all(full.parent().unwrap()).unwrap();
        std::fs::write(full, content).unwrap();
    }
    let repo = CodeRepository::new("repo1", "demo", &root);
    (outer, repo)
}

#[test]
fn s1_single_structure_with_method() {
    let (_dir, repo) = named_root(&[(
        "file.go",
        "package demo\n\ntype S struct {\n    x int\n}\n\nfunc (s *S) M() {}\n",
    )]);
    let store = MemoryGraphStore::new();
    analyze(&repo, &store);

    assert_eq!(
        relation_keys(&store, RelationType::DeclareEntity),
        vec!["repo1@demo@file.go#DeclareEntity#repo1@demo@file.go:S"]
    );
    assert_eq!(
        relation_keys(&store, RelationType::DeclareFunc),
        vec!["repo1@demo@file.go#DeclareFunc#repo1@demo:S.M"]
    );
    assert_eq!(
        relation_keys(&store, RelationType::HasMethod),
        vec!["repo1@demo@file.go:S#HasMethod#repo1@demo:S.M"]
    );
    assert!(store.entity("repo1@demo@file.go:S").is_some());
    assert!(store.function("repo1@demo:S.M").is_some());
}

#[test]
fn s2_cross_file_call_in_same_package() {
    let (_dir, repo) = named_root(&[
        ("a.go", "package demo\n\nfunc Caller() {\n    B()\n}\n"),
        ("b.go", "package demo\n\nfunc B() {}\n"),
    ]);
    let store = MemoryGraphStore::new();
    analyze(&repo, &store);

    assert_eq!(
        relation_keys(&store, RelationType::Call),
        vec!["repo1@demo:Caller#Call#repo1@demo:B"]
    );
}

#[test]
fn s3_interface_satisfaction() {
    let with_do = named_root(&[
        ("a.go", "package demo\n\ntype I interface {\n    Do()\n}\n"),
        ("b.go", "package demo\n\ntype T struct{}\n\nfunc (t *T) Do() {}\n"),
    ]);
    let store = MemoryGraphStore::new();
    analyze(&with_do.1, &store);
    assert_eq!(
        relation_keys(&store, RelationType::Implement),
        vec!["repo1@demo@b.go:T#Implement#repo1@demo@a.go:I"]
    );

    let implementors = store
        .get_implement_by_entity_id("repo1@demo@a.go:I")
        .unwrap();
    assert_eq!(implementors.len(), 1);
    assert_eq!(implementors[0].entity.name, "T");
    assert_eq!(implementors[0].methods.len(), 1);

    // Remove Do from T: no Implement edge.
    let without_do = named_root(&[
        ("a.go", "package demo\n\ntype I interface {\n    Do()\n}\n"),
        ("b.go", "package demo\n\ntype T struct{}\n"),
    ]);
    let empty_store = MemoryGraphStore::new();
    analyze(&without_do.1, &empty_store);
    assert!(relation_keys(&empty_store, RelationType::Implement).is_empty());
}

#[test]
fn s4_embedded_type_inheritance() {
    let (_dir, repo) = named_root(&[(
        "types.go",
        r#"package demo

type Base struct{}

func (b Base) M() {}

type Child struct {
    Base
}

type Doer interface {
    M()
}
"#,
    )]);
    let store = MemoryGraphStore::new();
    let model = analyze(&repo, &store);

    assert_eq!(
        relation_keys(&store, RelationType::Extends),
        vec!["repo1@demo@types.go:Child#Extends#repo1@demo@types.go:Base"]
    );

    let root = model.root().unwrap();
    let child = model.entity_in_package(root, "Child").unwrap();
    let doer = model.entity_in_package(root, "Doer").unwrap();
    assert!(implement::is_impl_interface(&model, child, doer));
    assert!(relation_keys(&store, RelationType::Implement)
        .contains(&"repo1@demo@types.go:Child#Implement#repo1@demo@types.go:Doer".to_string()));
}

#[test]
fn s5_chained_call_through_field() {
    let (_dir, repo) = named_root(&[
        ("go.mod", "module example.com/demo\n"),
        (
            "pkg/client.go",
            "package pkg\n\ntype T struct{}\n\nfunc (t *T) Method() {}\n",
        ),
        (
            "main.go",
            r#"package demo

import "example.com/demo/pkg"

type App struct {
    Field *pkg.T
}

func (a *App) Run() {
    a.Field.Method()
}
"#,
        ),
    ]);
    let store = MemoryGraphStore::new();
    analyze(&repo, &store);

    assert!(relation_keys(&store, RelationType::Call)
        .contains(&"repo1@demo:App.Run#Call#repo1@demo@pkg:T.Method".to_string()));
}

#[test]
fn s6_reanalysis_is_idempotent() {
    let (_dir, repo) = named_root(&[
        ("go.mod", "module example.com/demo\n"),
        (
            "core/core.go",
            "package core\n\ntype Engine struct{}\n\nfunc (e *Engine) Boot() {}\n\nfunc New() *Engine { return nil }\n",
        ),
        (
            "main.go",
            r#"package demo

import "example.com/demo/core"

func Run() {
    e := core.New()
    e.Boot()
}
"#,
        ),
    ]);
    let store = MemoryGraphStore::new();
    analyze(&repo, &store);
    let first_counts = store.counts();
    let first_keys = store.relation_keys();

    analyze(&repo, &store);
    assert_eq!(store.counts(), first_counts);
    assert_eq!(store.relation_keys(), first_keys);
}

#[test]
fn determinism_across_fresh_stores() {
    let (_dir, repo) = named_root(&[
        ("go.mod", "module example.com/demo\n"),
        (
            "a.go",
            "package demo\n\ntype S struct{}\n\nfunc (s *S) Go() {}\n\nfunc A() { B() }\n",
        ),
        ("b.go", "package demo\n\nfunc B() { A() }\n"),
    ]);

    let store_one = MemoryGraphStore::new();
    analyze(&repo, &store_one);
    let store_two = MemoryGraphStore::new();
    analyze(&repo, &store_two);

    assert_eq!(store_one.counts(), store_two.counts());
    assert_eq!(store_one.relation_keys(), store_two.relation_keys());
}

#[test]
fn relation_endpoints_reference_emitted_nodes() {
    let (_dir, repo) = named_root(&[
        ("go.mod", "module example.com/demo\n"),
        (
            "core/core.go",
            "package core\n\ntype T struct{}\n\nfunc (t *T) Do() {}\n",
        ),
        (
            "main.go",
            r#"package demo

import "example.com/demo/core"

type App struct {
    t core.T
}

func Run() {}
"#,
        ),
    ]);
    let store = MemoryGraphStore::new();
    let model = analyze(&repo, &store);

    let mut node_ids: std::collections::HashSet<String> = std::collections::HashSet::new();
    node_ids.extend(model.package_records().into_iter().map(|p| p.id));
    node_ids.extend(model.file_records().into_iter().map(|f| f.id));
    node_ids.extend(model.entity_records().into_iter().map(|e| e.id));
    node_ids.extend(model.function_records().into_iter().map(|f| f.id));
    // The repository itself is persisted outside this batch.
    node_ids.insert("repo1".to_string());

    for relation_type in RelationType::ALL {
        for relation in store.relations_of(relation_type) {
            assert!(
                node_ids.contains(&relation.source_id),
                "unknown source {} in {:?}",
                relation.source_id,
                relation_type
            );
            assert!(
                node_ids.contains(&relation.target_id),
                "unknown target {} in {:?}",
                relation.target_id,
                relation_type
            );
        }
    }
}

#[test]
fn cancellation_prevents_any_write() {
    let (_dir, repo) = named_root(&[("a.go", "package demo\n\nfunc A() {}\n")]);
    let store = MemoryGraphStore::new();
    let analyzer = CodeAnalyzer::new(AnalysisConfig::default());
    let token = CancellationToken::new();
    token.cancel();

    let result = analyzer.analyze(&repo, &store, &token);
    assert!(matches!(result, Err(AnalyzerError::Cancelled)));
    assert_eq!(store.counts().relations, 0);
    assert_eq!(store.counts().packages, 0);
}

#[test]
fn indexing_embeds_function_chunks() {
    let (_dir, repo) = named_root(&[(
        "a.go",
        "package demo\n\nfunc Greet() string {\n    return \"hi\"\n}\n",
    )]);
    let store = MemoryGraphStore::new();
    let analyzer = CodeAnalyzer::new(AnalysisConfig::default());
    let (model, _) = analyzer
        .analyze(&repo, &store, &CancellationToken::new())
        .unwrap();

    let vectors = MemoryVectorStore::new();
    let embedding = StaticEmbeddingClient::new(8);
    let indexer = Indexer::new(&embedding, &vectors, analyzer.cache());
    let indexed = indexer.index(&model).unwrap();
    assert_eq!(indexed, 1);
    assert_eq!(vectors.chunk_count("demo"), 1);

    let chunks = vectors
        .search_code_chunks_by_ids("demo", &["repo1@demo:Greet".to_string()], 10)
        .unwrap();
    assert_eq!(chunks.len(), 1);
    assert!(chunks[0].content.starts_with("func Greet"));
    assert_eq!(chunks[0].vector.len(), 8);
}

#[test]
fn indexing_without_llm_support_fails() {
    let (_dir, repo) = named_root(&[("a.go", "package demo\n\nfunc A() {}\n")]);
    let store = MemoryGraphStore::new();
    let analyzer = CodeAnalyzer::new(AnalysisConfig::default());
    let (model, _) = analyzer
        .analyze(&repo, &store, &CancellationToken::new())
        .unwrap();

    let vectors = MemoryVectorStore::new();
    let embedding = StaticEmbeddingClient::disabled();
    let indexer = Indexer::new(&embedding, &vectors, analyzer.cache());
    assert!(matches!(
        indexer.index(&model),
        Err(AnalyzerError::NotSupportLlm(_))
    ));
}

#[test]
fn call_chain_query_follows_edges() {
    let (_dir, repo) = named_root(&[(
        "chain.go",
        r#"package demo

func A() { B() }

func B() { C() }

func C() {}
"#,
    )]);
    let store = MemoryGraphStore::new();
    analyze(&repo, &store);

    let direct = store.query_call_relations("repo1@demo:A", 1).unwrap();
    assert_eq!(direct.len(), 1);
    assert_eq!(direct[0].callee_name, "B");

    let unbounded = store.query_call_relations("repo1@demo:A", 0).unwrap();
    assert_eq!(unbounded.len(), 2);
}
