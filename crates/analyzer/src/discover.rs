//! Repository traversal: walk the directory tree in sorted order,
//! parse and extract every selected file, and build the package tree.

use crate::config::{AnalysisConfig, FileFilter};
use crate::error::{AnalyzerError, Result};
use crate::extract;
use crate::model::repository::{CodeRepository, find_go_mod, module_name, valid_segment};
use crate::model::{CodeModel, PackageId};
use crate::writer::check_cancellation;
use parser_core::SourceParser;
use std::path::Path;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Outcome of one repository scan.
#[derive(Debug, Default)]
pub struct ScanOutcome {
    pub files_parsed: usize,
    pub files_skipped: usize,
    /// `(path, message)` for files that failed to read or parse.
    pub errors: Vec<(String, String)>,
}

/// Module path for local-import classification, if the repository
/// carries a go.mod.
pub fn resolve_module(repo: &CodeRepository) -> Option<String> {
    let go_mod = find_go_mod(&repo.local_path)?;
    match module_name(&go_mod) {
        Ok(module) => {
            info!(module = %module, "resolved module root");
            Some(module)
        }
        Err(error) => {
            warn!(%error, "failed to parse go.mod, treating all imports as external");
            None
        }
    }
}

/// Walk the repository and populate the model. The returned outcome
/// carries per-file failures; only directory-level I/O errors abort.
pub fn scan_repository(
    model: &mut CodeModel,
    repo: &CodeRepository,
    parser: &mut SourceParser,
    config: &AnalysisConfig,
    filter: &FileFilter,
    token: &CancellationToken,
) -> Result<ScanOutcome> {
    let root_name = repo.root_name()?;
    let root = model.add_package(None, &root_name, &repo.local_path);
    let mut outcome = ScanOutcome::default();
    scan_package(
        model,
        parser,
        root,
        &repo.local_path,
        config,
        filter,
        token,
        &mut outcome,
    )?;
    model.mark_retained();
    Ok(outcome)
}

#[allow(clippy::too_many_arguments)]
fn scan_package(
    model: &mut CodeModel,
    parser: &mut SourceParser,
    package: PackageId,
    dir: &Path,
    config: &AnalysisConfig,
    filter: &FileFilter,
    token: &CancellationToken,
    outcome: &mut ScanOutcome,
) -> Result<()> {
    check_cancellation(token)?;

    let mut entries: Vec<std::fs::DirEntry> =
        std::fs::read_dir(dir)?.collect::<std::io::Result<Vec<_>>>()?;
    // read_dir order is platform-dependent; sorted names keep the
    // emitted graph deterministic across runs.
    entries.sort_by_key(|entry| entry.file_name());

    for entry in entries {
        let name = entry.file_name().to_string_lossy().to_string();
        let path = entry.path();
        let file_type = entry.file_type()?;

        if file_type.is_dir() {
            if FileFilter::should_skip_folder(&name) {
                continue;
            }
            if !valid_segment(&name) {
                warn!(path = %path.display(), "skipping directory with reserved separator in name");
                continue;
            }
            let sub = model.add_package(Some(package), &name, &path);
            scan_package(model, parser, sub, &path, config, filter, token, outcome)?;
            continue;
        }

        if !filter.should_include(&name) {
            outcome.files_skipped += 1;
            continue;
        }
        if !valid_segment(&name) {
            warn!(path = %path.display(), "skipping file with reserved separator in name");
            outcome.files_skipped += 1;
            continue;
        }
        if let Ok(metadata) = entry.metadata() {
            if metadata.len() > config.max_file_size {
                outcome.files_skipped += 1;
                continue;
            }
        }

        let source = match std::fs::read_to_string(&path) {
            Ok(source) => source,
            Err(error) => {
                warn!(path = %path.display(), %error, "failed to read file, skipping");
                outcome
                    .errors
                    .push((path.display().to_string(), error.to_string()));
                continue;
            }
        };
        let path_display = path.display().to_string();
        match parser.parse(&source, Some(&path_display)) {
            Ok(parsed) => {
                let file = model.add_file(package, &name, &path);
                extract::extract_file(model, package, file, parsed.file);
                outcome.files_parsed += 1;
            }
            Err(source) => {
                let error = AnalyzerError::Parse {
                    path: path_display.clone(),
                    source,
                };
                warn!(path = %path_display, %error, "failed to parse file, skipping");
                outcome.errors.push((path_display, error.to_string()));
            }
        }
    }
    Ok(())
}
