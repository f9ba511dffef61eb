//! Relation store writer: flattens the model into node records,
//! deduplicates edges by composite key, and emits one batched upsert
//! per relation type.

use crate::error::{AnalyzerError, Result};
use crate::model::CodeModel;
use graph_store::{GraphStore, Relation, RelationType};
use rustc_hash::FxHashSet;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Counts of everything one write pass persisted.
#[derive(Debug, Clone, Default, Serialize)]
pub struct WriteSummary {
    pub packages: usize,
    pub files: usize,
    pub entities: usize,
    pub fields: usize,
    pub functions: usize,
    pub imports: usize,
    pub relations: usize,
}

pub struct RelationStoreWriter<'a> {
    store: &'a dyn GraphStore,
}

impl<'a> RelationStoreWriter<'a> {
    pub fn new(store: &'a dyn GraphStore) -> Self {
        Self { store }
    }

    /// Persist the model's nodes and the given edges. The cancellation
    /// handle is checked before each batch; a batch that has started is
    /// always driven to completion.
    pub fn write(
        &self,
        model: &CodeModel,
        relations: &[Relation],
        token: &CancellationToken,
    ) -> Result<WriteSummary> {
        let mut summary = WriteSummary::default();

        let packages = model.package_records();
        check_cancellation(token)?;
        self.store.save_packages(&packages)?;
        summary.packages = packages.len();

        let files = model.file_records();
        check_cancellation(token)?;
        self.store.save_files(&files)?;
        summary.files = files.len();

        let entities = model.entity_records();
        check_cancellation(token)?;
        self.store.save_entities(&entities)?;
        summary.entities = entities.len();

        let fields = model.field_records();
        check_cancellation(token)?;
        self.store.save_fields(&fields)?;
        summary.fields = fields.len();

        let functions = model.function_records();
        check_cancellation(token)?;
        self.store.save_functions(&functions)?;
        summary.functions = functions.len();

        let imports = model.import_records();
        check_cancellation(token)?;
        self.store.save_imports(&imports)?;
        summary.imports = imports.len();

        let deduped = dedup_relations(relations);
        for relation_type in RelationType::ALL {
            let batch: Vec<Relation> = deduped
                .iter()
                .filter(|r| r.relation_type == relation_type)
                .cloned()
                .collect();
            if batch.is_empty() {
                continue;
            }
            check_cancellation(token)?;
            debug!(
                relation_type = relation_type.as_str(),
                count = batch.len(),
                "writing relation batch"
            );
            self.store.save_relations(&batch)?;
            summary.relations += batch.len();
        }

        info!(
            packages = summary.packages,
            files = summary.files,
            entities = summary.entities,
            functions = summary.functions,
            relations = summary.relations,
            "graph write completed"
        );
        Ok(summary)
    }
}

pub fn check_cancellation(token: &CancellationToken) -> Result<()> {
    if token.is_cancelled() {
        return Err(AnalyzerError::Cancelled);
    }
    Ok(())
}

/// Drop duplicate edges by `source#type#target`, preserving first-seen
/// order. `emit(E); emit(E)` is therefore equivalent to `emit(E)`.
pub fn dedup_relations(relations: &[Relation]) -> Vec<Relation> {
    let mut seen = FxHashSet::default();
    relations
        .iter()
        .filter(|r| seen.insert(r.union_key()))
        .cloned()
        .collect()
}
