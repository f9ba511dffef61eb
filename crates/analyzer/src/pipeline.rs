//! Pipeline orchestration: traverse → parse → extract → classify →
//! resolve-and-build-calls → match-implementations → emit.

use crate::cache::FileContentCache;
use crate::classify;
use crate::config::{AnalysisConfig, FileFilter};
use crate::discover;
use crate::error::{AnalyzerError, Result};
use crate::implement;
use crate::model::repository::CodeRepository;
use crate::model::CodeModel;
use crate::relations::file_relations;
use crate::writer::{RelationStoreWriter, check_cancellation};
use graph_store::{GraphStore, Relation, RelationType};
use parser_core::SourceParser;
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::info;

/// What one analysis produced, for logging and the CLI summary.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub repository_id: String,
    pub files_parsed: usize,
    pub files_skipped: usize,
    pub packages: usize,
    pub files: usize,
    pub entities: usize,
    pub fields: usize,
    pub functions: usize,
    pub imports: usize,
    pub relations: usize,
    pub relations_by_type: BTreeMap<String, usize>,
    pub errors: Vec<(String, String)>,
    pub duration: Duration,
}

impl AnalysisReport {
    pub fn format_summary(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "Analysis of '{}' completed in {:?}:\n",
            self.repository_id, self.duration
        ));
        out.push_str(&format!(
            "  files parsed: {} (skipped {})\n",
            self.files_parsed, self.files_skipped
        ));
        out.push_str(&format!(
            "  nodes: {} packages, {} files, {} entities, {} fields, {} functions, {} imports\n",
            self.packages, self.files, self.entities, self.fields, self.functions, self.imports
        ));
        out.push_str(&format!("  relations: {}\n", self.relations));
        for (relation_type, count) in &self.relations_by_type {
            out.push_str(&format!("    {relation_type}: {count}\n"));
        }
        if !self.errors.is_empty() {
            out.push_str(&format!("  file errors: {}\n", self.errors.len()));
            for (path, message) in self.errors.iter().take(5) {
                out.push_str(&format!("    {path}: {message}\n"));
            }
        }
        out
    }
}

/// Runs the whole static analysis for one repository.
pub struct CodeAnalyzer {
    config: AnalysisConfig,
    cache: FileContentCache,
}

impl CodeAnalyzer {
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            config,
            cache: FileContentCache::default(),
        }
    }

    pub fn cache(&self) -> &FileContentCache {
        &self.cache
    }

    /// Parse and classify a repository into an in-memory model without
    /// touching any store.
    pub fn build_model(
        &self,
        repo: &CodeRepository,
        token: &CancellationToken,
    ) -> Result<(CodeModel, discover::ScanOutcome)> {
        let filter = FileFilter::new(repo.language, &self.merged_config(repo))?;
        let mut parser = SourceParser::new(repo.language)
            .map_err(|error| AnalyzerError::InvalidRepository(error.to_string()))?;

        let module = discover::resolve_module(repo);
        let mut model = CodeModel::new(repo, module);
        let outcome = discover::scan_repository(
            &mut model,
            repo,
            &mut parser,
            &self.config,
            &filter,
            token,
        )?;
        classify::classify(&mut model);
        Ok((model, outcome))
    }

    /// Full analysis: build the model, derive every relation, and emit
    /// nodes and batched relations to the graph store.
    pub fn analyze(
        &self,
        repo: &CodeRepository,
        store: &dyn GraphStore,
        token: &CancellationToken,
    ) -> Result<(CodeModel, AnalysisReport)> {
        let started = Instant::now();
        info!(repo = %repo.id, path = %repo.local_path.display(), "starting analysis");

        let (model, outcome) = self.build_model(repo, token)?;
        let relations = collect_relations(&model, token)?;

        let summary = RelationStoreWriter::new(store).write(&model, &relations, token)?;

        let mut relations_by_type = BTreeMap::new();
        for relation in crate::writer::dedup_relations(&relations) {
            *relations_by_type
                .entry(relation.relation_type.as_str().to_string())
                .or_insert(0) += 1;
        }

        let report = AnalysisReport {
            repository_id: repo.id.clone(),
            files_parsed: outcome.files_parsed,
            files_skipped: outcome.files_skipped,
            packages: summary.packages,
            files: summary.files,
            entities: summary.entities,
            fields: summary.fields,
            functions: summary.functions,
            imports: summary.imports,
            relations: summary.relations,
            relations_by_type,
            errors: outcome.errors,
            duration: started.elapsed(),
        };
        info!(
            repo = %repo.id,
            relations = report.relations,
            duration = ?report.duration,
            "analysis completed"
        );
        Ok((model, report))
    }

    /// Repository-level excludes and includes extend the configured
    /// patterns.
    fn merged_config(&self, repo: &CodeRepository) -> AnalysisConfig {
        let mut config = self.config.clone();
        config
            .includes
            .extend(repo.includes.iter().cloned().filter(|p| !p.is_empty()));
        config
            .excludes
            .extend(repo.excludes.iter().cloned().filter(|p| !p.is_empty()));
        config
    }
}

/// Containment, declaration, call, inheritance and implementation
/// edges for the whole model. `Implement` edges are derived only after
/// every package is classified.
fn collect_relations(model: &CodeModel, token: &CancellationToken) -> Result<Vec<Relation>> {
    let mut relations = Vec::new();

    for package in model.retained_packages() {
        check_cancellation(token)?;
        let package_data = model.package(package);

        for &file in &package_data.files {
            relations.push(Relation::new(
                RelationType::ContainsFile,
                package_data.id.clone(),
                model.file(file).id.clone(),
                0.0,
            ));
            relations.extend(file_relations(model, file));
        }

        let parent_id = match package_data.parent {
            Some(parent) => model.package(parent).id.clone(),
            None => model.repo_id.clone(),
        };
        relations.push(Relation::new(
            RelationType::Contains,
            parent_id,
            package_data.id.clone(),
            1.0,
        ));
    }

    relations.extend(implement::match_implementations(model));
    Ok(relations)
}
