//! The chunk record moved between stores.

use serde::{Deserialize, Deserializer, Serialize};

/// Name of the primary key field.
pub const FIELD_ID: &str = "id";
/// Name of the document id field.
pub const FIELD_DOCUMENT_ID: &str = "document_id";
/// Name of the chunk index field.
pub const FIELD_CHUNK_INDEX: &str = "chunk_index";
/// Name of the text field.
pub const FIELD_TEXT: &str = "text";
/// Name of the source URI field.
pub const FIELD_SOURCE: &str = "source";
/// Name of the creation timestamp field.
pub const FIELD_CREATED_AT: &str = "created_at";
/// Name of the vector field.
pub const FIELD_EMBEDDING: &str = "embedding";

/// Scalar fields, in schema order.
pub const SCALAR_FIELDS: [&str; 6] = [
    FIELD_ID,
    FIELD_DOCUMENT_ID,
    FIELD_CHUNK_INDEX,
    FIELD_TEXT,
    FIELD_SOURCE,
    FIELD_CREATED_AT,
];

/// One chunk of a source document together with its embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkRecord {
    /// Globally unique primary key.
    #[serde(deserialize_with = "int_or_string")]
    pub id: i64,

    /// Document the chunk belongs to.
    #[serde(default, deserialize_with = "int_or_string")]
    pub document_id: i64,

    /// Position of the chunk within its document.
    #[serde(default, deserialize_with = "int_or_string")]
    pub chunk_index: i64,

    /// Chunk text.
    #[serde(default)]
    pub text: String,

    /// Origin URI of the document.
    #[serde(default)]
    pub source: String,

    /// RFC 3339 creation timestamp.
    #[serde(default)]
    pub created_at: String,

    /// Embedding vector. Empty when the query did not ask for it.
    #[serde(default)]
    pub embedding: Vec<f32>,
}

impl ChunkRecord {
    /// Create a record with empty source/timestamp metadata.
    pub fn new(
        id: i64,
        document_id: i64,
        chunk_index: i64,
        text: impl Into<String>,
        embedding: Vec<f32>,
    ) -> Self {
        Self {
            id,
            document_id,
            chunk_index,
            text: text.into(),
            source: String::new(),
            created_at: String::new(),
            embedding,
        }
    }

    /// Set the source URI.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    /// Set the creation timestamp.
    pub fn with_created_at(mut self, created_at: impl Into<String>) -> Self {
        self.created_at = created_at.into();
        self
    }

    /// Copy of the record without its embedding.
    pub fn without_embedding(&self) -> Self {
        Self {
            embedding: Vec::new(),
            ..self.clone()
        }
    }
}

/// Accepts int64 values rendered either as JSON numbers or as strings.
pub(crate) fn int_or_string<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(i64),
        Str(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Int(v) => Ok(v),
        Raw::Str(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_numeric_and_string_ids() {
        let row: ChunkRecord = serde_json::from_value(serde_json::json!({
            "id": "42",
            "document_id": 3,
            "chunk_index": "1",
            "text": "hello",
            "embedding": [0.5, -0.25]
        }))
        .unwrap();

        assert_eq!(row.id, 42);
        assert_eq!(row.document_id, 3);
        assert_eq!(row.chunk_index, 1);
        assert_eq!(row.source, "");
        assert_eq!(row.embedding, vec![0.5, -0.25]);
    }

    #[test]
    fn test_decode_without_embedding() {
        let row: ChunkRecord = serde_json::from_value(serde_json::json!({
            "id": 1,
            "document_id": 0,
            "chunk_index": 0,
            "text": "t",
            "source": "mock://doc_0000",
            "created_at": "2025-01-01T00:00:00Z"
        }))
        .unwrap();
        assert!(row.embedding.is_empty());
        assert_eq!(row.source, "mock://doc_0000");
    }

    #[test]
    fn test_bad_id_is_rejected() {
        let result: Result<ChunkRecord, _> =
            serde_json::from_value(serde_json::json!({ "id": "abc" }));
        assert!(result.is_err());
    }

    #[test]
    fn test_builder() {
        let record = ChunkRecord::new(7, 1, 2, "body", vec![1.0; 4])
            .with_source("mock://doc_0001")
            .with_created_at("now");
        assert_eq!(record.source, "mock://doc_0001");
        assert!(record.without_embedding().embedding.is_empty());
        assert_eq!(record.without_embedding().text, "body");
    }
}
