//! The in-memory analysis model: a flat arena of packages, files,
//! entities and functions addressed by stable string IDs and typed
//! indices. Components hold indices and consult the model instead of
//! holding references into each other.

pub mod repository;
pub mod types;

use graph_store::{
    EntityRecord, FieldRecord, FileRecord, FunctionRecord, ImportRecord, PackageRecord,
};
use repository::{CodeRepository, PATH_SEP, gene_id};
use rustc_hash::FxHashMap;
use std::path::Path;
use types::{EntityData, FileData, FunctionData, PackageData};

macro_rules! arena_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(u32);

        impl $name {
            fn index(self) -> usize {
                self.0 as usize
            }
        }
    };
}

arena_id!(PackageId);
arena_id!(FileId);
arena_id!(EntityId);
arena_id!(FunctionId);

/// Everything one repository analysis knows, before any of it crosses
/// the store boundary.
pub struct CodeModel {
    pub repo_id: String,
    pub repo_name: String,
    /// Module path from go.mod; local-import classification keys on it.
    pub module: Option<String>,
    root: Option<PackageId>,
    packages: Vec<PackageData>,
    files: Vec<FileData>,
    entities: Vec<EntityData>,
    functions: Vec<FunctionData>,
    package_index: FxHashMap<String, PackageId>,
}

impl CodeModel {
    pub fn new(repo: &CodeRepository, module: Option<String>) -> Self {
        Self {
            repo_id: repo.id.clone(),
            repo_name: repo.name.clone(),
            module,
            root: None,
            packages: Vec::new(),
            files: Vec::new(),
            entities: Vec::new(),
            functions: Vec::new(),
            package_index: FxHashMap::default(),
        }
    }

    // ── Construction ──

    /// Package IDs always start with the repository ID.
    pub fn add_package(&mut self, parent: Option<PackageId>, name: &str, path: &Path) -> PackageId {
        let parent_id = match parent {
            Some(parent) => self.packages[parent.index()].id.clone(),
            None => self.repo_id.clone(),
        };
        let id = PackageId(self.packages.len() as u32);
        self.packages.push(PackageData {
            id: gene_id(&parent_id, name),
            name: name.to_string(),
            parent,
            path: path.to_path_buf(),
            subpackages: Vec::new(),
            files: Vec::new(),
            entity_names: FxHashMap::default(),
            function_names: FxHashMap::default(),
            retained: false,
        });
        match parent {
            Some(parent) => self.packages[parent.index()].subpackages.push(id),
            None => self.root = Some(id),
        }
        self.package_index
            .insert(self.packages[id.index()].id.clone(), id);
        id
    }

    pub fn add_file(&mut self, package: PackageId, name: &str, path: &Path) -> FileId {
        let id = FileId(self.files.len() as u32);
        let file_id = format!("{}{PATH_SEP}{name}", self.packages[package.index()].id);
        self.files.push(FileData {
            id: file_id,
            name: name.to_string(),
            package,
            path: path.to_path_buf(),
            imports: Vec::new(),
            local_imports: FxHashMap::default(),
            entities: Vec::new(),
            functions: Vec::new(),
            methods: Vec::new(),
        });
        self.packages[package.index()].files.push(id);
        id
    }

    /// Registers the entity on its file and in the package name map
    /// (first declaration wins).
    pub fn add_entity(&mut self, data: EntityData) -> EntityId {
        let id = EntityId(self.entities.len() as u32);
        let file = data.file;
        let package = data.package;
        let name = data.name.clone();
        self.entities.push(data);
        self.files[file.index()].entities.push(id);
        self.packages[package.index()]
            .entity_names
            .entry(name)
            .or_insert(id);
        id
    }

    pub fn add_function(&mut self, data: FunctionData) -> FunctionId {
        let id = FunctionId(self.functions.len() as u32);
        self.functions.push(data);
        id
    }

    // ── Accessors ──

    pub fn root(&self) -> Option<PackageId> {
        self.root
    }

    pub fn package(&self, id: PackageId) -> &PackageData {
        &self.packages[id.index()]
    }

    pub fn package_mut(&mut self, id: PackageId) -> &mut PackageData {
        &mut self.packages[id.index()]
    }

    pub fn file(&self, id: FileId) -> &FileData {
        &self.files[id.index()]
    }

    pub fn file_mut(&mut self, id: FileId) -> &mut FileData {
        &mut self.files[id.index()]
    }

    pub fn entity(&self, id: EntityId) -> &EntityData {
        &self.entities[id.index()]
    }

    pub fn entity_mut(&mut self, id: EntityId) -> &mut EntityData {
        &mut self.entities[id.index()]
    }

    pub fn function(&self, id: FunctionId) -> &FunctionData {
        &self.functions[id.index()]
    }

    pub fn function_mut(&mut self, id: FunctionId) -> &mut FunctionData {
        &mut self.functions[id.index()]
    }

    pub fn package_ids(&self) -> impl Iterator<Item = PackageId> + '_ {
        (0..self.packages.len()).map(|i| PackageId(i as u32))
    }

    pub fn file_ids(&self) -> impl Iterator<Item = FileId> + '_ {
        (0..self.files.len()).map(|i| FileId(i as u32))
    }

    pub fn entity_ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        (0..self.entities.len()).map(|i| EntityId(i as u32))
    }

    pub fn function_ids(&self) -> impl Iterator<Item = FunctionId> + '_ {
        (0..self.functions.len()).map(|i| FunctionId(i as u32))
    }

    // ── Lookups ──

    pub fn package_by_key(&self, key: &str) -> Option<PackageId> {
        self.package_index.get(key).copied()
    }

    pub fn entity_in_package(&self, package: PackageId, name: &str) -> Option<EntityId> {
        self.packages[package.index()]
            .entity_names
            .get(name)
            .copied()
    }

    pub fn function_in_package(&self, package: PackageId, name: &str) -> Option<FunctionId> {
        self.packages[package.index()]
            .function_names
            .get(name)
            .copied()
    }

    /// Entity by name in the package a local import points at.
    pub fn entity_for_import(&self, file: FileId, ref_name: &str, name: &str) -> Option<EntityId> {
        let package = self.imported_package(file, ref_name)?;
        self.entity_in_package(package, name)
    }

    /// Top-level function by name in the package a local import points at.
    pub fn function_for_import(
        &self,
        file: FileId,
        ref_name: &str,
        name: &str,
    ) -> Option<FunctionId> {
        let package = self.imported_package(file, ref_name)?;
        self.function_in_package(package, name)
    }

    pub fn imported_package(&self, file: FileId, ref_name: &str) -> Option<PackageId> {
        let file = &self.files[file.index()];
        let index = *file.local_imports.get(ref_name)?;
        let local_path = file.imports[index].local_path.as_deref()?;
        let key = self.foreign_package_key(local_path);
        self.package_by_key(&key)
    }

    /// Graph ID of the package a module-relative import path names.
    fn foreign_package_key(&self, local_path: &str) -> String {
        let root_id = match self.root {
            Some(root) => self.packages[root.index()].id.as_str(),
            None => self.repo_id.as_str(),
        };
        let trimmed = local_path.trim_start_matches('/');
        if trimmed.is_empty() {
            return root_id.to_string();
        }
        format!(
            "{root_id}{PATH_SEP}{}",
            trimmed.replace('/', &PATH_SEP.to_string())
        )
    }

    // ── Pruning ──

    /// Mark the packages that transitively contain at least one entity
    /// or top-level function; everything else is pruned from emission.
    pub fn mark_retained(&mut self) {
        let mut counts = vec![0usize; self.packages.len()];
        // Parents are always created before their children, so a
        // reverse sweep accumulates child counts bottom-up.
        for index in (0..self.packages.len()).rev() {
            let own: usize = self.packages[index]
                .files
                .iter()
                .map(|f| {
                    let file = &self.files[f.index()];
                    file.entities.len() + file.functions.len()
                })
                .sum();
            let children: usize = self.packages[index]
                .subpackages
                .iter()
                .map(|p| counts[p.index()])
                .sum();
            counts[index] = own + children;
        }
        for (index, package) in self.packages.iter_mut().enumerate() {
            package.retained = counts[index] > 0;
        }
    }

    pub fn retained_packages(&self) -> impl Iterator<Item = PackageId> + '_ {
        self.packages
            .iter()
            .enumerate()
            .filter(|(_, p)| p.retained)
            .map(|(i, _)| PackageId(i as u32))
    }

    fn is_retained(&self, package: PackageId) -> bool {
        self.packages[package.index()].retained
    }

    // ── Flattened records for persistence ──

    pub fn package_records(&self) -> Vec<PackageRecord> {
        self.packages
            .iter()
            .filter(|p| p.retained)
            .map(|p| PackageRecord {
                id: p.id.clone(),
                name: p.name.clone(),
                parent_id: match p.parent {
                    Some(parent) => self.packages[parent.index()].id.clone(),
                    None => self.repo_id.clone(),
                },
                path: p.path.to_string_lossy().to_string(),
            })
            .collect()
    }

    pub fn file_records(&self) -> Vec<FileRecord> {
        self.files
            .iter()
            .filter(|f| self.is_retained(f.package))
            .map(|f| FileRecord {
                id: f.id.clone(),
                name: f.name.clone(),
                package_id: self.packages[f.package.index()].id.clone(),
                path: f.path.to_string_lossy().to_string(),
            })
            .collect()
    }

    pub fn entity_records(&self) -> Vec<EntityRecord> {
        self.entities
            .iter()
            .filter(|e| self.is_retained(e.package))
            .map(|e| EntityRecord {
                id: e.id.clone(),
                name: e.name.clone(),
                kind: e.kind,
                file_id: self.files[e.file.index()].id.clone(),
                package_id: self.packages[e.package.index()].id.clone(),
                document: e.document.clone(),
            })
            .collect()
    }

    /// Field IDs append `_` then the field name, or the type string when
    /// the field is embedded.
    pub fn field_records(&self) -> Vec<FieldRecord> {
        let mut records = Vec::new();
        for entity in &self.entities {
            if !self.is_retained(entity.package) {
                continue;
            }
            for field in &entity.fields {
                let suffix = if field.name.is_empty() {
                    field.type_string.as_str()
                } else {
                    field.name.as_str()
                };
                records.push(FieldRecord {
                    id: format!("{}_{suffix}", entity.id),
                    name: field.name.clone(),
                    entity_id: entity.id.clone(),
                    type_string: field.type_string.clone(),
                });
            }
        }
        records
    }

    pub fn function_records(&self) -> Vec<FunctionRecord> {
        self.functions
            .iter()
            .filter(|f| self.is_retained(f.package))
            .map(|f| FunctionRecord {
                id: f.id.clone(),
                name: f.name.clone(),
                package_id: self.packages[f.package.index()].id.clone(),
                file_id: self.files[f.file.index()].id.clone(),
                entity_id: f.owner.map(|e| self.entities[e.index()].id.clone()),
                scope: f.scope,
                receiver: f.receiver.clone(),
                document: f.document.clone(),
                start_byte: f.start_byte as u64,
                end_byte: f.end_byte as u64,
            })
            .collect()
    }

    pub fn import_records(&self) -> Vec<ImportRecord> {
        self.files
            .iter()
            .filter(|f| self.is_retained(f.package))
            .flat_map(|f| f.imports.iter())
            .map(|import| ImportRecord {
                ref_name: import.ref_name.clone(),
                path: import.path.clone(),
                file_id: import.file_id.clone(),
                local: import.is_local(),
            })
            .collect()
    }
}
