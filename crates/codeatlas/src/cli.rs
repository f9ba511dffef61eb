use analyzer::model::repository::CodeRepository;
use analyzer::{AnalysisConfig, CodeAnalyzer};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use graph_store::memory::MemoryGraphStore;
use graph_store::Relation;
use serde::Serialize;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

#[derive(Parser, Debug)]
#[command(
    name = "codeatlas",
    version = "0.1.0",
    about = "Build a code knowledge graph from a source repository",
    long_about = "Parses a repository, extracts its symbols, resolves calls and \
                  interface implementations, and emits a typed knowledge graph."
)]
pub struct CodeatlasCli {
    #[command(subcommand)]
    pub command: Commands,
}

impl CodeatlasCli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyze a repository and print graph statistics
    Analyze {
        /// Repository root directory
        #[arg(default_value = ".")]
        repo_path: PathBuf,

        /// Repository identifier used as the graph ID prefix
        #[arg(long)]
        repo_id: Option<String>,

        /// Write the full graph snapshot as JSON to this path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Exclude pattern (regex over file names), repeatable
        #[arg(long = "exclude")]
        excludes: Vec<String>,

        /// Include pattern (regex over file names), repeatable
        #[arg(long = "include")]
        includes: Vec<String>,

        /// Enable verbose logging
        #[arg(short, long)]
        verbose: bool,
    },
}

/// Everything one analysis emitted, in storable form.
#[derive(Serialize)]
struct GraphSnapshot {
    repository: CodeRepository,
    packages: Vec<graph_store::PackageRecord>,
    files: Vec<graph_store::FileRecord>,
    entities: Vec<graph_store::EntityRecord>,
    fields: Vec<graph_store::FieldRecord>,
    functions: Vec<graph_store::FunctionRecord>,
    imports: Vec<graph_store::ImportRecord>,
    relations: Vec<Relation>,
}

pub fn run_analyze(
    repo_path: PathBuf,
    repo_id: Option<String>,
    output: Option<PathBuf>,
    excludes: Vec<String>,
    includes: Vec<String>,
) -> Result<()> {
    let repo_path = repo_path
        .canonicalize()
        .with_context(|| format!("repository path not found: {}", repo_path.display()))?;
    let name = repo_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .context("repository path has no final component")?;
    let repo_id = repo_id.unwrap_or_else(|| name.clone());

    let mut repo = CodeRepository::new(repo_id, name, &repo_path);
    repo.excludes = excludes;
    repo.includes = includes;

    let config = AnalysisConfig::default();
    let analyzer = CodeAnalyzer::new(config);
    let store = MemoryGraphStore::new();
    let token = CancellationToken::new();

    let (model, report) = analyzer
        .analyze(&repo, &store, &token)
        .with_context(|| format!("failed to analyze repository '{}'", repo.id))?;

    print!("{}", report.format_summary());

    if let Some(output) = output {
        let snapshot = GraphSnapshot {
            repository: repo,
            packages: model.package_records(),
            files: model.file_records(),
            entities: model.entity_records(),
            fields: model.field_records(),
            functions: model.function_records(),
            imports: model.import_records(),
            relations: store.relations(),
        };
        let file = std::fs::File::create(&output)
            .with_context(|| format!("failed to create {}", output.display()))?;
        serde_json::to_writer_pretty(file, &snapshot)?;
        println!("Graph snapshot written to {}", output.display());
    }

    Ok(())
}
