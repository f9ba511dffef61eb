//! In-memory store implementations with the same upsert semantics the
//! persistent adapters guarantee. Used by tests and the CLI.

use crate::error::StoreError;
use crate::graph::{
    CallRelation, EntityRecord, EntityWithMethods, FieldRecord, FileRecord, FunctionRecord,
    ImportRecord, PackageRecord, Relation, RelationType,
};
use crate::store::GraphStore;
use crate::vector::{ChunkScope, CodeChunk, SearchCodeChunksRequest, VectorStore};
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::VecDeque;
use std::sync::RwLock;

#[derive(Default)]
struct GraphState {
    packages: FxHashMap<String, PackageRecord>,
    files: FxHashMap<String, FileRecord>,
    entities: FxHashMap<String, EntityRecord>,
    fields: FxHashMap<String, FieldRecord>,
    functions: FxHashMap<String, FunctionRecord>,
    imports: FxHashMap<String, ImportRecord>,
    relations: FxHashMap<String, Relation>,
}

/// Graph store keeping everything in process. Writes upsert; re-running
/// an identical analysis leaves the state unchanged.
#[derive(Default)]
pub struct MemoryGraphStore {
    state: RwLock<GraphState>,
}

/// Node and relation counts, used to assert idempotency in tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphCounts {
    pub packages: usize,
    pub files: usize,
    pub entities: usize,
    pub fields: usize,
    pub functions: usize,
    pub imports: usize,
    pub relations: usize,
}

impl MemoryGraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn counts(&self) -> GraphCounts {
        let state = self.state.read().unwrap();
        GraphCounts {
            packages: state.packages.len(),
            files: state.files.len(),
            entities: state.entities.len(),
            fields: state.fields.len(),
            functions: state.functions.len(),
            imports: state.imports.len(),
            relations: state.relations.len(),
        }
    }

    /// All stored relations of one type, for assertions.
    pub fn relations_of(&self, relation_type: RelationType) -> Vec<Relation> {
        let state = self.state.read().unwrap();
        let mut relations: Vec<Relation> = state
            .relations
            .values()
            .filter(|r| r.relation_type == relation_type)
            .cloned()
            .collect();
        relations.sort_by(|a, b| a.union_key().cmp(&b.union_key()));
        relations
    }

    /// Every stored relation, sorted by composite key.
    pub fn relations(&self) -> Vec<Relation> {
        let state = self.state.read().unwrap();
        let mut relations: Vec<Relation> = state.relations.values().cloned().collect();
        relations.sort_by(|a, b| a.union_key().cmp(&b.union_key()));
        relations
    }

    /// Sorted union keys of every stored relation, for set-equality
    /// assertions across reruns.
    pub fn relation_keys(&self) -> Vec<String> {
        let state = self.state.read().unwrap();
        let mut keys: Vec<String> = state.relations.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn entity(&self, id: &str) -> Option<EntityRecord> {
        self.state.read().unwrap().entities.get(id).cloned()
    }

    pub fn function(&self, id: &str) -> Option<FunctionRecord> {
        self.state.read().unwrap().functions.get(id).cloned()
    }
}

impl GraphStore for MemoryGraphStore {
    fn save_packages(&self, packages: &[PackageRecord]) -> Result<(), StoreError> {
        let mut state = self.state.write().unwrap();
        for package in packages {
            state.packages.insert(package.id.clone(), package.clone());
        }
        Ok(())
    }

    fn save_files(&self, files: &[FileRecord]) -> Result<(), StoreError> {
        let mut state = self.state.write().unwrap();
        for file in files {
            state.files.insert(file.id.clone(), file.clone());
        }
        Ok(())
    }

    fn save_entities(&self, entities: &[EntityRecord]) -> Result<(), StoreError> {
        let mut state = self.state.write().unwrap();
        for entity in entities {
            state.entities.insert(entity.id.clone(), entity.clone());
        }
        Ok(())
    }

    fn save_fields(&self, fields: &[FieldRecord]) -> Result<(), StoreError> {
        let mut state = self.state.write().unwrap();
        for field in fields {
            state.fields.insert(field.id.clone(), field.clone());
        }
        Ok(())
    }

    fn save_functions(&self, functions: &[FunctionRecord]) -> Result<(), StoreError> {
        let mut state = self.state.write().unwrap();
        for function in functions {
            state.functions.insert(function.id.clone(), function.clone());
        }
        Ok(())
    }

    fn save_imports(&self, imports: &[ImportRecord]) -> Result<(), StoreError> {
        let mut state = self.state.write().unwrap();
        for import in imports {
            let key = format!("{}#{}", import.file_id, import.path);
            state.imports.insert(key, import.clone());
        }
        Ok(())
    }

    fn save_relations(&self, relations: &[Relation]) -> Result<(), StoreError> {
        let mut state = self.state.write().unwrap();
        for relation in relations {
            state
                .relations
                .insert(relation.union_key(), relation.clone());
        }
        Ok(())
    }

    fn query_call_relations(
        &self,
        function_id: &str,
        depth: i32,
    ) -> Result<Vec<CallRelation>, StoreError> {
        let state = self.state.read().unwrap();

        let mut adjacency: FxHashMap<&str, Vec<&str>> = FxHashMap::default();
        for relation in state.relations.values() {
            if relation.relation_type == RelationType::Call {
                adjacency
                    .entry(relation.source_id.as_str())
                    .or_default()
                    .push(relation.target_id.as_str());
            }
        }
        for targets in adjacency.values_mut() {
            targets.sort();
        }

        let mut rows = Vec::new();
        let mut seen_edges: FxHashSet<(String, String)> = FxHashSet::default();
        let mut visited: FxHashSet<String> = FxHashSet::default();
        let mut queue: VecDeque<(String, i32)> = VecDeque::new();
        queue.push_back((function_id.to_string(), 0));
        visited.insert(function_id.to_string());

        while let Some((caller_id, level)) = queue.pop_front() {
            if depth > 0 && level >= depth {
                continue;
            }
            let targets = match adjacency.get(caller_id.as_str()) {
                Some(targets) => targets,
                None => continue,
            };
            for callee_id in targets {
                if !seen_edges.insert((caller_id.clone(), callee_id.to_string())) {
                    continue;
                }
                let caller = state.functions.get(caller_id.as_str());
                let callee = state.functions.get(*callee_id);
                if let (Some(caller), Some(callee)) = (caller, callee) {
                    rows.push(CallRelation {
                        caller_id: caller.id.clone(),
                        caller_name: caller.name.clone(),
                        caller_file_id: caller.file_id.clone(),
                        caller_scope: caller.scope,
                        caller_entity_id: caller.entity_id.clone(),
                        callee_id: callee.id.clone(),
                        callee_name: callee.name.clone(),
                        callee_file_id: callee.file_id.clone(),
                        callee_scope: callee.scope,
                        callee_entity_id: callee.entity_id.clone(),
                    });
                }
                if visited.insert(callee_id.to_string()) {
                    queue.push_back((callee_id.to_string(), level + 1));
                }
            }
        }
        Ok(rows)
    }

    fn get_function_by_file_id(&self, file_id: &str) -> Result<Vec<FunctionRecord>, StoreError> {
        let state = self.state.read().unwrap();
        let mut functions: Vec<FunctionRecord> = state
            .functions
            .values()
            .filter(|f| f.file_id == file_id)
            .cloned()
            .collect();
        functions.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(functions)
    }

    fn get_implement_by_entity_id(
        &self,
        interface_id: &str,
    ) -> Result<Vec<EntityWithMethods>, StoreError> {
        let state = self.state.read().unwrap();
        let mut implementors = Vec::new();
        let mut relations: Vec<&Relation> = state
            .relations
            .values()
            .filter(|r| r.relation_type == RelationType::Implement && r.target_id == interface_id)
            .collect();
        relations.sort_by(|a, b| a.source_id.cmp(&b.source_id));

        for relation in relations {
            if let Some(entity) = state.entities.get(&relation.source_id) {
                let mut methods: Vec<FunctionRecord> = state
                    .functions
                    .values()
                    .filter(|f| f.entity_id.as_deref() == Some(entity.id.as_str()))
                    .cloned()
                    .collect();
                methods.sort_by(|a, b| a.id.cmp(&b.id));
                implementors.push(EntityWithMethods {
                    entity: entity.clone(),
                    methods,
                });
            }
        }
        Ok(implementors)
    }
}

type PartitionMap = FxHashMap<String, FxHashMap<String, CodeChunk>>;

/// Vector store keeping chunks per collection and partition; search is
/// an exact cosine-similarity scan.
#[derive(Default)]
pub struct MemoryVectorStore {
    collections: RwLock<FxHashMap<String, PartitionMap>>,
}

impl MemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn chunk_count(&self, collection: &str) -> usize {
        self.collections
            .read()
            .unwrap()
            .get(collection)
            .map(|partitions| partitions.values().map(|chunks| chunks.len()).sum())
            .unwrap_or(0)
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.is_empty() || a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

impl VectorStore for MemoryVectorStore {
    fn save_code_chunks(
        &self,
        collection: &str,
        partition: &str,
        chunks: &[CodeChunk],
    ) -> Result<(), StoreError> {
        let mut collections = self.collections.write().unwrap();
        let partitions = collections.entry(collection.to_string()).or_default();
        let stored = partitions.entry(partition.to_string()).or_default();
        for chunk in chunks {
            stored.insert(chunk.id.clone(), chunk.clone());
        }
        Ok(())
    }

    fn search_code_chunks(
        &self,
        request: &SearchCodeChunksRequest,
    ) -> Result<Vec<CodeChunk>, StoreError> {
        let collections = self.collections.read().unwrap();
        let partitions = match collections.get(&request.collection) {
            Some(partitions) => partitions,
            None => return Ok(Vec::new()),
        };

        let mut scored: Vec<(f32, &CodeChunk)> = partitions
            .iter()
            .filter(|(name, _)| request.partition.is_empty() || **name == request.partition)
            .flat_map(|(_, chunks)| chunks.values())
            .map(|chunk| (cosine_similarity(&request.vector, &chunk.vector), chunk))
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        Ok(scored
            .into_iter()
            .take(request.limit)
            .map(|(_, chunk)| chunk.clone())
            .collect())
    }

    fn search_code_chunks_by_ids(
        &self,
        collection: &str,
        ids: &[String],
        limit: usize,
    ) -> Result<Vec<CodeChunk>, StoreError> {
        let collections = self.collections.read().unwrap();
        let partitions = match collections.get(collection) {
            Some(partitions) => partitions,
            None => return Ok(Vec::new()),
        };
        let wanted: FxHashSet<&str> = ids.iter().map(String::as_str).collect();
        let mut found: Vec<CodeChunk> = partitions
            .values()
            .flat_map(|chunks| chunks.values())
            .filter(|chunk| wanted.contains(chunk.id.as_str()))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.id.cmp(&b.id));
        found.truncate(limit);
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::FunctionScope;

    fn function(id: &str, name: &str) -> FunctionRecord {
        FunctionRecord {
            id: id.to_string(),
            name: name.to_string(),
            package_id: "repo@pkg".to_string(),
            file_id: "repo@pkg@main.go".to_string(),
            entity_id: None,
            scope: FunctionScope::Top,
            receiver: None,
            document: String::new(),
            start_byte: 0,
            end_byte: 0,
        }
    }

    fn call(source: &str, target: &str) -> Relation {
        Relation::new(RelationType::Call, source, target, 1.0)
    }

    #[test]
    fn relation_upserts_are_idempotent() {
        let store = MemoryGraphStore::new();
        let edge = call("a", "b");
        store.save_relations(&[edge.clone()]).unwrap();
        store.save_relations(&[edge]).unwrap();
        assert_eq!(store.counts().relations, 1);
    }

    #[test]
    fn call_traversal_respects_depth() {
        let store = MemoryGraphStore::new();
        store
            .save_functions(&[function("a", "A"), function("b", "B"), function("c", "C")])
            .unwrap();
        store
            .save_relations(&[call("a", "b"), call("b", "c")])
            .unwrap();

        let one = store.query_call_relations("a", 1).unwrap();
        assert_eq!(one.len(), 1);
        assert_eq!(one[0].callee_id, "b");

        let all = store.query_call_relations("a", 0).unwrap();
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn call_traversal_terminates_on_cycles() {
        let store = MemoryGraphStore::new();
        store
            .save_functions(&[function("a", "A"), function("b", "B")])
            .unwrap();
        store
            .save_relations(&[call("a", "b"), call("b", "a")])
            .unwrap();

        let rows = store.query_call_relations("a", 0).unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn vector_search_ranks_by_similarity() {
        let store = MemoryVectorStore::new();
        let chunk = |id: &str, vector: Vec<f32>| CodeChunk {
            id: id.to_string(),
            path: "f".to_string(),
            content: id.to_string(),
            document: String::new(),
            scope: ChunkScope::Function,
            vector,
        };
        store
            .save_code_chunks(
                "repo",
                "p1",
                &[chunk("near", vec![1.0, 0.0]), chunk("far", vec![0.0, 1.0])],
            )
            .unwrap();

        let results = store
            .search_code_chunks(&SearchCodeChunksRequest {
                collection: "repo".to_string(),
                partition: "p1".to_string(),
                vector: vec![1.0, 0.1],
                limit: 1,
            })
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "near");
    }
}
