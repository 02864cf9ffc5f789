//! Schema inspector.
//!
//! Reads a collection's schema, load state, row count and a few sample rows.
//! The only side effect is the optional flush before counting.

use chunkbridge_store::vector::{CollectionSchema, IdRange, OutputFields, QueryRequest};
use chunkbridge_store::{ChunkRecord, VectorStore};
use serde::Serialize;
use tracing::{debug, warn};

use crate::errors::{BridgeError, BridgeResult};
use crate::generate::DEFAULT_COLLECTION;

/// Default number of sample rows.
pub const DEFAULT_SAMPLE: usize = 5;

/// Number of leading embedding values shown in a sample row.
pub const EMBEDDING_PREVIEW_LEN: usize = 5;

/// Options for [`inspect`].
#[derive(Debug, Clone)]
pub struct InspectOptions {
    pub collection: String,
    /// Flush before counting so recent inserts are included.
    pub flush: bool,
    /// Number of sample rows; 0 disables sampling.
    pub sample: usize,
    /// Show the embedding dimension and a preview in sample rows.
    pub include_embedding: bool,
}

impl Default for InspectOptions {
    fn default() -> Self {
        Self {
            collection: DEFAULT_COLLECTION.to_string(),
            flush: true,
            sample: DEFAULT_SAMPLE,
            include_embedding: false,
        }
    }
}

/// One sample row as reported to the user.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleRow {
    pub id: i64,
    pub document_id: i64,
    pub chunk_index: i64,
    pub text: String,
    pub source: String,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding_dim: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding_preview: Option<Vec<f32>>,
}

impl SampleRow {
    fn from_record(record: ChunkRecord, include_embedding: bool) -> Self {
        let (embedding_dim, embedding_preview) = if include_embedding {
            let preview = record
                .embedding
                .iter()
                .take(EMBEDDING_PREVIEW_LEN)
                .copied()
                .collect();
            (Some(record.embedding.len()), Some(preview))
        } else {
            (None, None)
        };
        Self {
            id: record.id,
            document_id: record.document_id,
            chunk_index: record.chunk_index,
            text: record.text,
            source: record.source,
            created_at: record.created_at,
            embedding_dim,
            embedding_preview,
        }
    }
}

/// Everything the inspector found.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectReport {
    pub collection: String,
    pub schema: CollectionSchema,
    pub load_state: Option<String>,
    pub row_count: u64,
    /// `None` when sampling was disabled.
    pub sample_rows: Option<Vec<SampleRow>>,
}

/// Inspect `options.collection`.
pub fn inspect(store: &dyn VectorStore, options: &InspectOptions) -> BridgeResult<InspectReport> {
    let name = options.collection.as_str();
    if !store.has_collection(name)? {
        return Err(BridgeError::CollectionNotFound(name.to_string()));
    }

    if options.flush {
        if let Err(e) = store.flush(name) {
            warn!("Flush of collection {} failed: {}", name, e);
        }
    }

    let description = store.describe_collection(name)?;
    store.load_collection(name)?;
    let row_count = store.count(name)?;
    debug!("Collection {} holds {} rows", name, row_count);

    let sample_rows = if options.sample > 0 {
        let fields = if options.include_embedding {
            OutputFields::All
        } else {
            OutputFields::Scalars
        };
        let request =
            QueryRequest::new(IdRange::starting_at(0), options.sample).with_fields(fields);
        let rows = store.query(name, &request)?;
        Some(
            rows.into_iter()
                .map(|r| SampleRow::from_record(r, options.include_embedding))
                .collect(),
        )
    } else {
        None
    };

    Ok(InspectReport {
        collection: name.to_string(),
        schema: description.schema,
        load_state: description.load_state,
        row_count,
        sample_rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chunkbridge_store::vector::MemoryVectorStore;

    fn store_with(n: i64) -> MemoryVectorStore {
        let rows = (0..n)
            .map(|id| ChunkRecord::new(id, 0, id, format!("chunk {id}"), vec![0.5; 8]))
            .collect();
        MemoryVectorStore::with_rows("chunk", CollectionSchema::chunk(8), rows)
    }

    #[test]
    fn test_missing_collection_is_distinct() {
        let store = MemoryVectorStore::new();
        let err = inspect(&store, &InspectOptions::default()).unwrap_err();
        assert!(matches!(err, BridgeError::CollectionNotFound(ref n) if n == "chunk"));
    }

    #[test]
    fn test_report_without_embedding() {
        let store = store_with(12);
        let report = inspect(&store, &InspectOptions::default()).unwrap();

        assert_eq!(report.row_count, 12);
        assert_eq!(report.schema.embedding_dim(), Some(8));
        let sample = report.sample_rows.unwrap();
        assert_eq!(sample.len(), DEFAULT_SAMPLE);
        assert_eq!(sample[0].id, 0);
        assert!(sample[0].embedding_dim.is_none());

        let json = serde_json::to_value(&sample[0]).unwrap();
        assert!(json.get("embeddingPreview").is_none());
    }

    #[test]
    fn test_embedding_preview() {
        let store = store_with(2);
        let options = InspectOptions {
            include_embedding: true,
            sample: 10,
            ..InspectOptions::default()
        };
        let report = inspect(&store, &options).unwrap();
        let sample = report.sample_rows.unwrap();
        assert_eq!(sample.len(), 2);
        assert_eq!(sample[1].embedding_dim, Some(8));
        assert_eq!(sample[1].embedding_preview.as_deref(), Some(&[0.5; 5][..]));
    }

    #[test]
    fn test_report_json_keys_are_camel_case() {
        let store = store_with(1);
        let options = InspectOptions {
            include_embedding: true,
            ..InspectOptions::default()
        };
        let json = serde_json::to_value(inspect(&store, &options).unwrap()).unwrap();

        let row = &json["sampleRows"][0];
        assert_eq!(row["documentId"], 0);
        assert_eq!(row["chunkIndex"], 0);
        assert_eq!(row["embeddingDim"], 8);
        assert_eq!(row["embeddingPreview"].as_array().map(Vec::len), Some(5));
        assert!(row.get("created_at").is_none());
        assert!(row.get("createdAt").is_some());
        assert!(json["schema"].get("enableDynamicField").is_some());
    }

    #[test]
    fn test_sampling_disabled() {
        let store = store_with(3);
        let options = InspectOptions {
            sample: 0,
            flush: false,
            ..InspectOptions::default()
        };
        let report = inspect(&store, &options).unwrap();
        assert!(report.sample_rows.is_none());

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["rowCount"], 3);
        assert_eq!(json["collection"], "chunk");
    }
}
