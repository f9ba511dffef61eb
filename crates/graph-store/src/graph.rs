//! Node records and typed relationships of the code knowledge graph.
//!
//! Records are flat and id-keyed: the analyzer's in-memory model is
//! flattened into these before anything crosses the store boundary.

use serde::{Deserialize, Serialize};

/// Directed edge types of the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationType {
    /// Package contains a sub-package.
    Contains,
    /// Package contains a file.
    ContainsFile,
    /// File declares an entity.
    DeclareEntity,
    /// File declares a function.
    DeclareFunc,
    /// Entity has a field of another entity's type.
    HasFields,
    /// Entity owns a method.
    HasMethod,
    /// Entity embeds another entity.
    Extends,
    /// Structure implements an interface.
    Implement,
    /// Function calls another function.
    Call,
    /// File imports a local package.
    Import,
}

impl RelationType {
    /// Stable emission order for batched writes.
    pub const ALL: [RelationType; 10] = [
        RelationType::Contains,
        RelationType::ContainsFile,
        RelationType::DeclareEntity,
        RelationType::DeclareFunc,
        RelationType::HasFields,
        RelationType::HasMethod,
        RelationType::Extends,
        RelationType::Implement,
        RelationType::Call,
        RelationType::Import,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RelationType::Contains => "Contains",
            RelationType::ContainsFile => "ContainsFile",
            RelationType::DeclareEntity => "DeclareEntity",
            RelationType::DeclareFunc => "DeclareFunc",
            RelationType::HasFields => "HasFields",
            RelationType::HasMethod => "HasMethod",
            RelationType::Extends => "Extends",
            RelationType::Implement => "Implement",
            RelationType::Call => "Call",
            RelationType::Import => "Import",
        }
    }
}

/// A directed, typed edge between two graph nodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relation {
    pub source_id: String,
    pub target_id: String,
    pub relation_type: RelationType,
    pub confidence: f64,
}

impl Relation {
    pub fn new(
        relation_type: RelationType,
        source_id: impl Into<String>,
        target_id: impl Into<String>,
        confidence: f64,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            target_id: target_id.into(),
            relation_type,
            confidence,
        }
    }

    /// Composite dedup key; upserts are keyed on this.
    pub fn union_key(&self) -> String {
        format!(
            "{}#{}#{}",
            self.source_id,
            self.relation_type.as_str(),
            self.target_id
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Structure,
    Interface,
    Constant,
    Variable,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Structure => "Structure",
            EntityKind::Interface => "Interface",
            EntityKind::Constant => "Constant",
            EntityKind::Variable => "Variable",
        }
    }
}

/// Where a function is declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FunctionScope {
    Top,
    Method,
    Interface,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageRecord {
    pub id: String,
    pub name: String,
    pub parent_id: String,
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: String,
    pub name: String,
    pub package_id: String,
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityRecord {
    pub id: String,
    pub name: String,
    pub kind: EntityKind,
    pub file_id: String,
    pub package_id: String,
    pub document: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldRecord {
    pub id: String,
    /// Empty when the field is an embedded type.
    pub name: String,
    pub entity_id: String,
    pub type_string: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionRecord {
    pub id: String,
    pub name: String,
    pub package_id: String,
    pub file_id: String,
    /// Owning entity for methods and interface methods.
    pub entity_id: Option<String>,
    pub scope: FunctionScope,
    pub receiver: Option<String>,
    pub document: String,
    /// Half-open byte offsets of the declaration in its file.
    pub start_byte: u64,
    pub end_byte: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportRecord {
    pub ref_name: String,
    pub path: String,
    pub file_id: String,
    pub local: bool,
}

/// One row of a bounded-depth call traversal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallRelation {
    pub caller_id: String,
    pub caller_name: String,
    pub caller_file_id: String,
    pub caller_scope: FunctionScope,
    pub caller_entity_id: Option<String>,
    pub callee_id: String,
    pub callee_name: String,
    pub callee_file_id: String,
    pub callee_scope: FunctionScope,
    pub callee_entity_id: Option<String>,
}

/// An implementing entity together with its methods.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityWithMethods {
    pub entity: EntityRecord,
    pub methods: Vec<FunctionRecord>,
}
