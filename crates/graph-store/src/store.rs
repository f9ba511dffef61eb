//! The graph-store adapter boundary.

use crate::error::StoreError;
use crate::graph::{
    CallRelation, EntityRecord, EntityWithMethods, FieldRecord, FileRecord, FunctionRecord,
    ImportRecord, PackageRecord, Relation,
};

/// Persistent side of the knowledge graph. All writes are idempotent
/// upserts keyed on the record IDs; relations upsert on
/// `(source, type, target)`.
pub trait GraphStore: Send + Sync {
    fn save_packages(&self, packages: &[PackageRecord]) -> Result<(), StoreError>;
    fn save_files(&self, files: &[FileRecord]) -> Result<(), StoreError>;
    fn save_entities(&self, entities: &[EntityRecord]) -> Result<(), StoreError>;
    fn save_fields(&self, fields: &[FieldRecord]) -> Result<(), StoreError>;
    fn save_functions(&self, functions: &[FunctionRecord]) -> Result<(), StoreError>;
    fn save_imports(&self, imports: &[ImportRecord]) -> Result<(), StoreError>;
    fn save_relations(&self, relations: &[Relation]) -> Result<(), StoreError>;

    /// Bounded-depth reachability over `Call` edges starting at a
    /// function. `depth <= 0` means unbounded. Rows are deduplicated on
    /// caller → callee.
    fn query_call_relations(
        &self,
        function_id: &str,
        depth: i32,
    ) -> Result<Vec<CallRelation>, StoreError>;

    fn get_function_by_file_id(&self, file_id: &str) -> Result<Vec<FunctionRecord>, StoreError>;

    /// All structures implementing the given interface, with their
    /// methods loaded.
    fn get_implement_by_entity_id(
        &self,
        interface_id: &str,
    ) -> Result<Vec<EntityWithMethods>, StoreError>;
}
