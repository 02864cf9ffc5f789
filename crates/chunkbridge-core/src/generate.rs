//! Mock data generator.
//!
//! Fills a vector store collection with synthetic chunk records:
//!
//! 1. Validates the options before touching the store
//! 2. Ensures the collection (optionally dropping it first)
//! 3. Resolves the first id, appending after existing rows by default
//! 4. Inserts generated chunks in batches, reporting progress per batch
//! 5. Flushes the collection
//!
//! Batches already inserted stay in place when a later batch fails.

use std::time::{Duration, Instant};

use chrono::{SecondsFormat, Utc};
use chunkbridge_store::vector::{CollectionSchema, DEFAULT_EMBEDDING_DIM};
use chunkbridge_store::{ChunkRecord, VectorStore};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::errors::{BridgeError, BridgeResult};
use crate::mock::MockPlan;

// ============================================================================
// Constants
// ============================================================================

pub const DEFAULT_COLLECTION: &str = "chunk";
pub const DEFAULT_DOCS: u32 = 3;
pub const DEFAULT_CHUNKS_PER_DOC: u32 = 5;
pub const DEFAULT_BATCH_SIZE: usize = 128;

// ============================================================================
// Types
// ============================================================================

/// Options for [`generate`].
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    pub collection: String,
    pub docs: u32,
    pub chunks_per_doc: u32,
    pub batch_size: usize,
    /// Drop and recreate the collection first.
    pub recreate: bool,
    /// First primary key. `None` appends after the highest existing id.
    pub start_id: Option<i64>,
    /// Embedding dimension for a newly created collection.
    pub dim: usize,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            collection: DEFAULT_COLLECTION.to_string(),
            docs: DEFAULT_DOCS,
            chunks_per_doc: DEFAULT_CHUNKS_PER_DOC,
            batch_size: DEFAULT_BATCH_SIZE,
            recreate: false,
            start_id: None,
            dim: DEFAULT_EMBEDDING_DIM,
        }
    }
}

impl GenerateOptions {
    /// Check option values; never touches a store.
    pub fn validate(&self) -> BridgeResult<()> {
        if self.collection.trim().is_empty() {
            return Err(BridgeError::invalid_argument("--collection must not be empty"));
        }
        if self.batch_size == 0 {
            return Err(BridgeError::invalid_argument_with_hint(
                "--batch-size must be at least 1",
                "Use the default of 128",
            ));
        }
        if self.dim == 0 {
            return Err(BridgeError::invalid_argument("--dim must be at least 1"));
        }
        if let Some(start) = self.start_id {
            let total = u64::from(self.docs) * u64::from(self.chunks_per_doc);
            let fits = i64::try_from(total)
                .ok()
                .and_then(|t| start.checked_add(t))
                .is_some();
            if !fits {
                return Err(BridgeError::invalid_argument(format!(
                    "--start-id {} leaves no room for {} chunks",
                    start, total
                )));
            }
        }
        Ok(())
    }

    /// Number of chunks the run inserts.
    pub fn total(&self) -> u64 {
        u64::from(self.docs) * u64::from(self.chunks_per_doc)
    }
}

/// Progress after each committed batch.
#[derive(Debug, Clone, Copy)]
pub struct GenerateProgress {
    pub inserted: u64,
    pub total: u64,
    pub batches: u64,
}

/// Outcome of [`generate`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateReport {
    pub collection: String,
    /// Whether this run created the collection.
    pub created: bool,
    /// Embedding dimension actually used.
    pub dim: usize,
    pub first_id: i64,
    /// Last id inserted; `None` when nothing was inserted.
    pub last_id: Option<i64>,
    pub inserted: u64,
    pub batches: u64,
    #[serde(with = "duration_ms")]
    pub elapsed: Duration,
}

// ============================================================================
// Public Functions
// ============================================================================

/// Generate mock chunks into `options.collection`.
pub fn generate<F>(
    store: &dyn VectorStore,
    options: &GenerateOptions,
    mut on_progress: F,
) -> BridgeResult<GenerateReport>
where
    F: FnMut(&GenerateProgress),
{
    options.validate()?;
    let started = Instant::now();
    let name = options.collection.as_str();

    let (created, dim) = ensure_collection(store, options)?;

    let first_id = match options.start_id {
        Some(id) => id,
        None if created => 1,
        None => match store.max_id(name)? {
            Some(max) => max.checked_add(1).ok_or_else(|| {
                BridgeError::invalid_argument_with_hint(
                    format!("collection {} already holds id {}", name, max),
                    "Pass --start-id explicitly",
                )
            })?,
            None => 1,
        },
    };
    if i64::try_from(options.total())
        .ok()
        .and_then(|t| first_id.checked_add(t))
        .is_none()
    {
        return Err(BridgeError::invalid_argument(format!(
            "first id {} leaves no room for {} chunks",
            first_id,
            options.total()
        )));
    }
    info!(
        collection = name,
        first_id,
        total = options.total(),
        "Generating mock chunks"
    );

    let plan = MockPlan {
        docs: options.docs,
        chunks_per_doc: options.chunks_per_doc,
        first_id,
        dim,
        created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, false),
    };

    let mut progress = GenerateProgress {
        inserted: 0,
        total: plan.total(),
        batches: 0,
    };
    let mut last_id = None;
    let mut batch: Vec<ChunkRecord> = Vec::with_capacity(options.batch_size);

    for record in plan.chunks() {
        batch.push(record);
        if batch.len() >= options.batch_size {
            last_id = insert_batch(store, name, &mut batch, &mut progress)?;
            on_progress(&progress);
        }
    }
    if !batch.is_empty() {
        last_id = insert_batch(store, name, &mut batch, &mut progress)?;
        on_progress(&progress);
    }

    if let Err(e) = store.flush(name) {
        warn!("Flush of collection {} failed: {}", name, e);
    }

    Ok(GenerateReport {
        collection: name.to_string(),
        created,
        dim,
        first_id,
        last_id,
        inserted: progress.inserted,
        batches: progress.batches,
        elapsed: started.elapsed(),
    })
}

// ============================================================================
// Internal Helpers
// ============================================================================

/// Make sure the collection exists; returns (created, embedding dim).
fn ensure_collection(store: &dyn VectorStore, options: &GenerateOptions) -> BridgeResult<(bool, usize)> {
    let name = options.collection.as_str();
    let mut exists = store.has_collection(name)?;

    if exists && options.recreate {
        info!("Dropping collection {}", name);
        store.drop_collection(name)?;
        exists = false;
    }

    if !exists {
        info!("Creating collection {} (dim {})", name, options.dim);
        store.create_collection(name, &CollectionSchema::chunk(options.dim))?;
        return Ok((true, options.dim));
    }

    let description = store.describe_collection(name)?;
    let dim = match description.schema.embedding_dim() {
        Some(dim) if dim != options.dim => {
            warn!(
                "Collection {} has embedding dim {}, ignoring --dim {}",
                name, dim, options.dim
            );
            dim
        }
        Some(dim) => dim,
        None => options.dim,
    };
    debug!("Reusing collection {} (dim {})", name, dim);
    Ok((false, dim))
}

fn insert_batch(
    store: &dyn VectorStore,
    name: &str,
    batch: &mut Vec<ChunkRecord>,
    progress: &mut GenerateProgress,
) -> BridgeResult<Option<i64>> {
    let last = batch.last().map(|r| r.id);
    let count = store.insert(name, batch)?;
    debug!("Inserted batch of {} rows into {}", count, name);
    progress.inserted += count as u64;
    progress.batches += 1;
    batch.clear();
    Ok(last)
}

pub(crate) mod duration_ms {
    use std::time::Duration;

    use serde::Serializer;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chunkbridge_store::vector::MemoryVectorStore;

    fn options() -> GenerateOptions {
        GenerateOptions {
            docs: 2,
            chunks_per_doc: 5,
            batch_size: 4,
            dim: 8,
            ..GenerateOptions::default()
        }
    }

    #[test]
    fn test_validation_happens_before_io() {
        let store = MemoryVectorStore::new();
        for bad in [
            GenerateOptions {
                batch_size: 0,
                ..options()
            },
            GenerateOptions { dim: 0, ..options() },
            GenerateOptions {
                start_id: Some(i64::MAX),
                ..options()
            },
        ] {
            let err = generate(&store, &bad, |_| {}).unwrap_err();
            assert_eq!(err.exit_code(), 2);
        }
        assert_eq!(store.calls(), 0);
    }

    #[test]
    fn test_batches_and_progress() {
        let store = MemoryVectorStore::new();
        let mut seen = Vec::new();
        let report = generate(&store, &options(), |p| seen.push(p.inserted)).unwrap();

        assert!(report.created);
        assert_eq!(report.inserted, 10);
        assert_eq!(report.batches, 3);
        assert_eq!(report.first_id, 1);
        assert_eq!(report.last_id, Some(10));
        assert_eq!(seen, vec![4, 8, 10]);

        let rows = store.rows("chunk");
        assert_eq!(rows.len(), 10);
        assert_eq!(rows[9].document_id, 1);
        assert_eq!(rows[9].chunk_index, 4);
        assert_eq!(rows[0].embedding.len(), 8);
    }

    #[test]
    fn test_second_run_appends() {
        let store = MemoryVectorStore::new();
        generate(&store, &options(), |_| {}).unwrap();
        let report = generate(&store, &options(), |_| {}).unwrap();

        assert!(!report.created);
        assert_eq!(report.first_id, 11);
        assert_eq!(report.last_id, Some(20));
        assert_eq!(store.rows("chunk").len(), 20);
    }

    #[test]
    fn test_recreate_and_explicit_start() {
        let store = MemoryVectorStore::new();
        generate(&store, &options(), |_| {}).unwrap();

        let report = generate(
            &store,
            &GenerateOptions {
                recreate: true,
                start_id: Some(500),
                ..options()
            },
            |_| {},
        )
        .unwrap();
        assert!(report.created);
        let ids: Vec<i64> = store.rows("chunk").iter().map(|r| r.id).collect();
        assert_eq!(ids.first(), Some(&500));
        assert_eq!(ids.len(), 10);
    }

    #[test]
    fn test_existing_dimension_wins() {
        let store = MemoryVectorStore::new();
        store
            .create_collection("chunk", &CollectionSchema::chunk(4))
            .unwrap();
        let report = generate(&store, &options(), |_| {}).unwrap();
        assert_eq!(report.dim, 4);
        assert!(store.rows("chunk").iter().all(|r| r.embedding.len() == 4));
    }

    #[test]
    fn test_report_json_keys_are_camel_case() {
        let store = MemoryVectorStore::new();
        let report = generate(&store, &options(), |_| {}).unwrap();
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["firstId"], 1);
        assert_eq!(json["lastId"], 10);
        assert_eq!(json["inserted"], 10);
        assert!(json.get("first_id").is_none());
        assert!(json["elapsed"].is_u64());
    }

    #[test]
    fn test_zero_docs_inserts_nothing() {
        let store = MemoryVectorStore::new();
        let report = generate(
            &store,
            &GenerateOptions {
                docs: 0,
                ..options()
            },
            |_| {},
        )
        .unwrap();
        assert_eq!(report.inserted, 0);
        assert_eq!(report.last_id, None);
        assert_eq!(report.batches, 0);
    }
}
