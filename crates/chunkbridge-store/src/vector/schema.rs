//! Collection schema and query range types.

use serde::{Deserialize, Serialize};

use crate::record::{
    FIELD_CHUNK_INDEX, FIELD_CREATED_AT, FIELD_DOCUMENT_ID, FIELD_EMBEDDING, FIELD_ID,
    FIELD_SOURCE, FIELD_TEXT, SCALAR_FIELDS,
};

// ============================================================================
// Constants
// ============================================================================

/// Default embedding dimension of the chunk collection.
pub const DEFAULT_EMBEDDING_DIM: usize = 1536;

/// Maximum length of the `text` field.
pub const TEXT_MAX_LENGTH: u32 = 65_535;

/// Maximum length of the `source` field.
pub const SOURCE_MAX_LENGTH: u32 = 2_048;

/// Maximum length of the `created_at` field.
pub const CREATED_AT_MAX_LENGTH: u32 = 64;

// ============================================================================
// FieldType
// ============================================================================

/// Data type of a collection field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldType {
    Int64,
    VarChar,
    FloatVector,
    /// Any type this crate does not model.
    Other(String),
}

impl FieldType {
    /// Parse a type name as reported by the store.
    pub fn parse(name: &str) -> Self {
        match name {
            "Int64" => Self::Int64,
            "VarChar" => Self::VarChar,
            "FloatVector" => Self::FloatVector,
            other => Self::Other(other.to_string()),
        }
    }

    /// Type name as the store spells it.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Int64 => "Int64",
            Self::VarChar => "VarChar",
            Self::FloatVector => "FloatVector",
            Self::Other(name) => name,
        }
    }
}

impl From<String> for FieldType {
    fn from(name: String) -> Self {
        Self::parse(&name)
    }
}

impl From<FieldType> for String {
    fn from(data_type: FieldType) -> Self {
        data_type.as_str().to_string()
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// FieldSchema
// ============================================================================

/// One field of a collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSchema {
    pub name: String,
    pub data_type: FieldType,
    #[serde(default)]
    pub is_primary: bool,
    #[serde(default)]
    pub auto_id: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dim: Option<usize>,
}

impl FieldSchema {
    /// Create a plain field of the given type.
    pub fn new(name: impl Into<String>, data_type: FieldType) -> Self {
        Self {
            name: name.into(),
            data_type,
            is_primary: false,
            auto_id: false,
            max_length: None,
            dim: None,
        }
    }

    /// Mark the field as the primary key.
    pub fn primary(mut self) -> Self {
        self.is_primary = true;
        self
    }

    /// Set the maximum length (VarChar).
    pub fn with_max_length(mut self, max_length: u32) -> Self {
        self.max_length = Some(max_length);
        self
    }

    /// Set the dimension (FloatVector).
    pub fn with_dim(mut self, dim: usize) -> Self {
        self.dim = Some(dim);
        self
    }
}

// ============================================================================
// CollectionSchema
// ============================================================================

/// Field layout of a collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionSchema {
    pub fields: Vec<FieldSchema>,
    #[serde(default)]
    pub enable_dynamic_field: bool,
}

impl CollectionSchema {
    /// The fixed chunk schema with an embedding of `dim` values.
    pub fn chunk(dim: usize) -> Self {
        Self {
            fields: vec![
                FieldSchema::new(FIELD_ID, FieldType::Int64).primary(),
                FieldSchema::new(FIELD_DOCUMENT_ID, FieldType::Int64),
                FieldSchema::new(FIELD_CHUNK_INDEX, FieldType::Int64),
                FieldSchema::new(FIELD_TEXT, FieldType::VarChar).with_max_length(TEXT_MAX_LENGTH),
                FieldSchema::new(FIELD_SOURCE, FieldType::VarChar)
                    .with_max_length(SOURCE_MAX_LENGTH),
                FieldSchema::new(FIELD_CREATED_AT, FieldType::VarChar)
                    .with_max_length(CREATED_AT_MAX_LENGTH),
                FieldSchema::new(FIELD_EMBEDDING, FieldType::FloatVector).with_dim(dim),
            ],
            enable_dynamic_field: true,
        }
    }

    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Dimension of the `embedding` field, if present.
    pub fn embedding_dim(&self) -> Option<usize> {
        self.field(FIELD_EMBEDDING).and_then(|f| f.dim)
    }
}

/// Result of describing a collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionDescription {
    pub name: String,
    pub schema: CollectionSchema,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load_state: Option<String>,
}

// ============================================================================
// IdRange / OutputFields
// ============================================================================

/// Half-open primary key interval `[start, end)`.
///
/// `end == None` means the range is unbounded above.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdRange {
    pub start: i64,
    pub end: Option<i64>,
}

impl IdRange {
    /// Bounded range `[start, end)`.
    pub fn new(start: i64, end: i64) -> Self {
        Self {
            start,
            end: Some(end),
        }
    }

    /// Range `[start, ∞)`.
    pub fn starting_at(start: i64) -> Self {
        Self { start, end: None }
    }

    /// True when no id can fall inside the range.
    pub fn is_empty(&self) -> bool {
        matches!(self.end, Some(end) if end <= self.start)
    }

    /// Whether `id` falls inside the range.
    pub fn contains(&self, id: i64) -> bool {
        id >= self.start && self.end.map_or(true, |end| id < end)
    }

    /// Boolean filter expression over the primary key.
    pub fn filter_expr(&self) -> String {
        match self.end {
            Some(end) => format!("{FIELD_ID} >= {} && {FIELD_ID} < {}", self.start, end),
            None => format!("{FIELD_ID} >= {}", self.start),
        }
    }
}

impl std::fmt::Display for IdRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.end {
            Some(end) => write!(f, "[{},{})", self.start, end),
            None => write!(f, "[{},end)", self.start),
        }
    }
}

/// Which fields a query returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFields {
    /// Every scalar field; the embedding comes back empty.
    #[default]
    Scalars,
    /// Scalars plus the embedding.
    All,
}

impl OutputFields {
    /// Field names to request.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names = SCALAR_FIELDS.to_vec();
        if matches!(self, Self::All) {
            names.push(FIELD_EMBEDDING);
        }
        names
    }

    /// Whether the embedding is requested.
    pub fn includes_embedding(&self) -> bool {
        matches!(self, Self::All)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_schema() {
        let schema = CollectionSchema::chunk(8);
        assert_eq!(schema.fields.len(), 7);
        assert_eq!(schema.embedding_dim(), Some(8));
        assert!(schema.field("id").unwrap().is_primary);
        assert!(!schema.field("id").unwrap().auto_id);
        assert_eq!(schema.field("text").unwrap().max_length, Some(65_535));
        assert!(schema.enable_dynamic_field);
    }

    #[test]
    fn test_field_type_parse() {
        assert_eq!(FieldType::parse("Int64"), FieldType::Int64);
        assert_eq!(FieldType::parse("FloatVector"), FieldType::FloatVector);
        assert_eq!(
            FieldType::parse("JSON"),
            FieldType::Other("JSON".to_string())
        );
        assert_eq!(FieldType::Other("JSON".to_string()).to_string(), "JSON");
        assert_eq!(
            serde_json::to_value(FieldType::VarChar).unwrap(),
            serde_json::json!("VarChar")
        );
    }

    #[test]
    fn test_id_range_filter_expr() {
        assert_eq!(IdRange::new(5, 10).filter_expr(), "id >= 5 && id < 10");
        assert_eq!(IdRange::starting_at(0).filter_expr(), "id >= 0");
    }

    #[test]
    fn test_id_range_contains() {
        let range = IdRange::new(5, 10);
        assert!(!range.contains(4));
        assert!(range.contains(5));
        assert!(range.contains(9));
        assert!(!range.contains(10));
        assert!(IdRange::starting_at(3).contains(i64::MAX));
    }

    #[test]
    fn test_id_range_empty() {
        assert!(IdRange::new(10, 10).is_empty());
        assert!(IdRange::new(10, 3).is_empty());
        assert!(!IdRange::new(0, 1).is_empty());
        assert!(!IdRange::starting_at(10).is_empty());
        assert_eq!(IdRange::new(1, 4).to_string(), "[1,4)");
        assert_eq!(IdRange::starting_at(2).to_string(), "[2,end)");
    }

    #[test]
    fn test_output_fields() {
        assert!(!OutputFields::Scalars.names().contains(&"embedding"));
        assert!(OutputFields::All.names().contains(&"embedding"));
        assert_eq!(OutputFields::All.names().len(), 7);
    }
}
