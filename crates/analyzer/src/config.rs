//! Analysis configuration and file selection rules.

use crate::error::Result;
use parser_core::Language;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Configuration for one repository analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Include patterns (regex over file names). Empty means everything
    /// with the language's extension.
    pub includes: Vec<String>,
    /// Exclude patterns (regex over file names). Excludes win over
    /// includes.
    pub excludes: Vec<String>,
    /// Files larger than this are skipped.
    pub max_file_size: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            includes: Vec::new(),
            excludes: Vec::new(),
            max_file_size: 5_000_000,
        }
    }
}

/// Compiled file selection rules for one analysis run.
pub struct FileFilter {
    extension: &'static str,
    includes: Vec<Regex>,
    excludes: Vec<Regex>,
}

impl FileFilter {
    pub fn new(language: Language, config: &AnalysisConfig) -> Result<Self> {
        let compile = |patterns: &[String]| -> Result<Vec<Regex>> {
            patterns
                .iter()
                .filter(|p| !p.is_empty())
                .map(|p| Regex::new(p).map_err(Into::into))
                .collect()
        };
        Ok(Self {
            extension: language.extension(),
            includes: compile(&config.includes)?,
            excludes: compile(&config.excludes)?,
        })
    }

    /// Whether a file takes part in the analysis. Extension must match
    /// the language; excludes deny; a non-empty include list is an
    /// allow-list.
    pub fn should_include(&self, file_name: &str) -> bool {
        if !file_name.ends_with(self.extension) {
            return false;
        }
        if self.excludes.iter().any(|p| p.is_match(file_name)) {
            return false;
        }
        if !self.includes.is_empty() {
            return self.includes.iter().any(|p| p.is_match(file_name));
        }
        true
    }

    /// Folders that never contain analyzable sources.
    pub fn should_skip_folder(name: &str) -> bool {
        matches!(name, "." | ".git" | ".github")
    }
}
