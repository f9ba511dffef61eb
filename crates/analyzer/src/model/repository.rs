//! Repository identity and file access.

use crate::error::{AnalyzerError, Result};
use parser_core::Language;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Reserved path separator inside graph IDs. Segment names must never
/// contain it.
pub const PATH_SEP: char = '@';

/// A registered source repository. Cloning and persistence of these
/// records live outside the analyzer; this carries what the pipeline
/// needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeRepository {
    pub id: String,
    pub name: String,
    pub local_path: PathBuf,
    pub language: Language,
    pub description: String,
    pub includes: Vec<String>,
    pub excludes: Vec<String>,
}

impl CodeRepository {
    pub fn new(id: impl Into<String>, name: impl Into<String>, local_path: impl Into<PathBuf>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            local_path: local_path.into(),
            language: Language::Go,
            description: String::new(),
            includes: Vec::new(),
            excludes: Vec::new(),
        }
    }

    /// Name of the root package: the last component of the local path.
    pub fn root_name(&self) -> Result<String> {
        self.local_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| {
                AnalyzerError::InvalidRepository(format!(
                    "repository path has no final component: {}",
                    self.local_path.display()
                ))
            })
    }

    /// Translate a graph file ID back into a path under the repository
    /// and read it. The ID prefix `repo_id@root_name@` is stripped and
    /// the remaining separators become path components.
    pub fn read_file(&self, file_id: &str) -> Result<String> {
        let mut rest = file_id;
        for prefix in [self.id.as_str(), &self.root_name()?] {
            rest = rest.strip_prefix(prefix).unwrap_or(rest);
            rest = rest.strip_prefix(PATH_SEP).unwrap_or(rest);
        }
        let relative: PathBuf = rest.split(PATH_SEP).collect();
        let path = self.local_path.join(relative);
        Ok(std::fs::read_to_string(&path)?)
    }
}

/// Whether a path segment is usable inside graph IDs.
pub fn valid_segment(segment: &str) -> bool {
    !segment.contains(PATH_SEP)
}

/// `parent_id @ name`, the ID scheme of the package tree.
pub fn gene_id(parent_id: &str, name: &str) -> String {
    if parent_id.is_empty() {
        name.to_string()
    } else {
        format!("{parent_id}{PATH_SEP}{name}")
    }
}

/// Resolve the nearest `go.mod` walking up from a directory.
pub fn find_go_mod(start: &Path) -> Option<PathBuf> {
    let mut dir = start;
    loop {
        let candidate = dir.join("go.mod");
        if candidate.is_file() {
            return Some(candidate);
        }
        dir = dir.parent()?;
    }
}

/// Parse the `module` directive out of a go.mod file.
pub fn module_name(go_mod: &Path) -> Result<String> {
    let content = std::fs::read_to_string(go_mod)?;
    for line in content.lines() {
        let line = line.trim();
        if let Some(rest) = line.strip_prefix("module") {
            let name = rest.trim().trim_matches('"');
            if !name.is_empty() {
                return Ok(name.to_string());
            }
        }
    }
    Err(AnalyzerError::InvalidRepository(format!(
        "no module declaration found in {}",
        go_mod.display()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gene_id_joins_with_separator() {
        assert_eq!(gene_id("", "root"), "root");
        assert_eq!(gene_id("repo@root", "internal"), "repo@root@internal");
    }

    #[test]
    fn module_name_parses_go_mod() {
        let dir = tempfile::tempdir().unwrap();
        let go_mod = dir.path().join("go.mod");
        std::fs::write(&go_mod, "module example.com/app\n\ngo 1.22\n").unwrap();
        assert_eq!(module_name(&go_mod).unwrap(), "example.com/app");
    }

    #[test]
    fn find_go_mod_walks_up() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("go.mod"), "module m\n").unwrap();
        let nested = dir.path().join("a/b");
        std::fs::create_dir_all(&nested).unwrap();
        assert_eq!(find_go_mod(&nested).unwrap(), dir.path().join("go.mod"));
    }

    #[test]
    fn read_file_translates_graph_ids() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("app");
        std::fs::create_dir_all(root.join("internal")).unwrap();
        std::fs::write(root.join("internal/server.go"), "package internal\n").unwrap();

        let repo = CodeRepository::new("r1", "app", &root);
        let content = repo.read_file("r1@app@internal@server.go").unwrap();
        assert_eq!(content, "package internal\n");
    }
}
