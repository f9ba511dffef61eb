//! Shared helpers for unit tests: build a model straight from source
//! snippets without touching the filesystem.

use crate::extract;
use crate::model::repository::CodeRepository;
use crate::model::{CodeModel, PackageId};
use parser_core::{Language, SourceParser};
use rustc_hash::FxHashMap;
use std::path::Path;

/// Build a classified-ready model from `(package_path, file_name,
/// source)` triples. `package_path` is `""` for the root package or a
/// `/`-separated chain of subpackages.
pub fn build_model(module: Option<&str>, files: &[(&str, &str, &str)]) -> CodeModel {
    let repo = CodeRepository::new("repo", "app", "/tmp/app");
    let mut model = CodeModel::new(&repo, module.map(str::to_string));
    let root = model.add_package(None, "app", Path::new("/tmp/app"));

    let mut packages: FxHashMap<String, PackageId> = FxHashMap::default();
    packages.insert(String::new(), root);

    let mut parser = SourceParser::new(Language::Go).expect("go parser");
    for (package_path, file_name, source) in files {
        let package = ensure_package(&mut model, &mut packages, root, package_path);
        let file = model.add_file(package, file_name, Path::new(file_name));
        let parsed = parser.parse(source, Some(file_name)).expect("parse fixture");
        extract::extract_file(&mut model, package, file, parsed.file);
    }

    model.mark_retained();
    crate::classify::classify(&mut model);
    model
}

fn ensure_package(
    model: &mut CodeModel,
    packages: &mut FxHashMap<String, PackageId>,
    root: PackageId,
    path: &str,
) -> PackageId {
    if path.is_empty() {
        return root;
    }
    let mut current = root;
    let mut key = String::new();
    for segment in path.split('/') {
        if !key.is_empty() {
            key.push('/');
        }
        key.push_str(segment);
        current = match packages.get(&key) {
            Some(existing) => *existing,
            None => {
                let created = model.add_package(Some(current), segment, Path::new(segment));
                packages.insert(key.clone(), created);
                created
            }
        };
    }
    current
}
