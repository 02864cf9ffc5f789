//! In-memory vector store backend.
//!
//! Keeps collections in a `BTreeMap` behind a lock. Intended for tests: it
//! records how many calls it served and can be told to fail like a dropped
//! connection.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use tracing::trace;

use super::super::schema::{CollectionDescription, CollectionSchema, IdRange};
use super::super::traits::{QueryRequest, VectorStore};
use crate::error::{StoreError, StoreResult};
use crate::record::ChunkRecord;

const STORE: &str = "memory vector store";

#[derive(Debug, Clone)]
struct MemoryCollection {
    schema: CollectionSchema,
    rows: BTreeMap<i64, ChunkRecord>,
}

/// In-memory vector store.
#[derive(Default)]
pub struct MemoryVectorStore {
    collections: RwLock<BTreeMap<String, MemoryCollection>>,
    calls: AtomicUsize,
    offline: RwLock<bool>,
}

impl MemoryVectorStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding one collection with the given rows.
    pub fn with_rows(name: &str, schema: CollectionSchema, rows: Vec<ChunkRecord>) -> Self {
        let store = Self::new();
        {
            let mut collections = store
                .collections
                .write()
                .unwrap_or_else(|e| e.into_inner());
            collections.insert(
                name.to_string(),
                MemoryCollection {
                    schema,
                    rows: rows.into_iter().map(|r| (r.id, r)).collect(),
                },
            );
        }
        store
    }

    /// Number of trait calls served so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Make every following call fail with a connection error.
    pub fn set_offline(&self, offline: bool) {
        *self.offline.write().unwrap_or_else(|e| e.into_inner()) = offline;
    }

    /// Snapshot of a collection's rows in id order.
    pub fn rows(&self, name: &str) -> Vec<ChunkRecord> {
        self.collections
            .read()
            .map(|c| {
                c.get(name)
                    .map(|col| col.rows.values().cloned().collect())
                    .unwrap_or_default()
            })
            .unwrap_or_default()
    }

    fn enter(&self, op: &str) -> StoreResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        trace!("memory vector store: {}", op);
        let offline = *self
            .offline
            .read()
            .map_err(|e| StoreError::internal(format!("Failed to acquire read lock: {}", e)))?;
        if offline {
            return Err(StoreError::connection(STORE, "store is offline"));
        }
        Ok(())
    }

    fn with_collection<T>(
        &self,
        name: &str,
        f: impl FnOnce(&MemoryCollection) -> T,
    ) -> StoreResult<T> {
        let collections = self
            .collections
            .read()
            .map_err(|e| StoreError::internal(format!("Failed to acquire read lock: {}", e)))?;
        collections
            .get(name)
            .map(f)
            .ok_or_else(|| StoreError::CollectionNotFound {
                name: name.to_string(),
            })
    }
}

impl VectorStore for MemoryVectorStore {
    fn has_collection(&self, name: &str) -> StoreResult<bool> {
        self.enter("has_collection")?;
        let collections = self
            .collections
            .read()
            .map_err(|e| StoreError::internal(format!("Failed to acquire read lock: {}", e)))?;
        Ok(collections.contains_key(name))
    }

    fn drop_collection(&self, name: &str) -> StoreResult<()> {
        self.enter("drop_collection")?;
        let mut collections = self
            .collections
            .write()
            .map_err(|e| StoreError::internal(format!("Failed to acquire write lock: {}", e)))?;
        collections.remove(name);
        Ok(())
    }

    fn create_collection(&self, name: &str, schema: &CollectionSchema) -> StoreResult<()> {
        self.enter("create_collection")?;
        let mut collections = self
            .collections
            .write()
            .map_err(|e| StoreError::internal(format!("Failed to acquire write lock: {}", e)))?;
        if collections.contains_key(name) {
            return Err(StoreError::api(
                STORE,
                65535,
                format!("collection {} already exists", name),
            ));
        }
        collections.insert(
            name.to_string(),
            MemoryCollection {
                schema: schema.clone(),
                rows: BTreeMap::new(),
            },
        );
        Ok(())
    }

    fn describe_collection(&self, name: &str) -> StoreResult<CollectionDescription> {
        self.enter("describe_collection")?;
        self.with_collection(name, |col| CollectionDescription {
            name: name.to_string(),
            schema: col.schema.clone(),
            load_state: Some("LoadStateLoaded".to_string()),
        })
    }

    fn load_collection(&self, name: &str) -> StoreResult<()> {
        self.enter("load_collection")?;
        self.with_collection(name, |_| ())
    }

    fn flush(&self, name: &str) -> StoreResult<()> {
        self.enter("flush")?;
        self.with_collection(name, |_| ())
    }

    fn count(&self, name: &str) -> StoreResult<u64> {
        self.enter("count")?;
        self.with_collection(name, |col| col.rows.len() as u64)
    }

    fn insert(&self, name: &str, rows: &[ChunkRecord]) -> StoreResult<usize> {
        self.enter("insert")?;
        let mut collections = self
            .collections
            .write()
            .map_err(|e| StoreError::internal(format!("Failed to acquire write lock: {}", e)))?;
        let col = collections
            .get_mut(name)
            .ok_or_else(|| StoreError::CollectionNotFound {
                name: name.to_string(),
            })?;

        let dim = col.schema.embedding_dim();
        for row in rows {
            if let Some(expected) = dim {
                if row.embedding.len() != expected {
                    return Err(StoreError::DimensionMismatch {
                        expected,
                        actual: row.embedding.len(),
                    });
                }
            }
        }
        for row in rows {
            col.rows.insert(row.id, row.clone());
        }
        Ok(rows.len())
    }

    fn query(&self, name: &str, request: &QueryRequest) -> StoreResult<Vec<ChunkRecord>> {
        self.enter("query")?;
        let include_embedding = request.fields.includes_embedding();
        self.with_collection(name, |col| {
            let lower = std::ops::Bound::Included(request.range.start);
            let upper = match request.range.end {
                Some(end) if end <= request.range.start => return Vec::new(),
                Some(end) => std::ops::Bound::Excluded(end),
                None => std::ops::Bound::Unbounded,
            };
            col.rows
                .range((lower, upper))
                .take(request.limit)
                .map(|(_, row)| {
                    if include_embedding {
                        row.clone()
                    } else {
                        row.without_embedding()
                    }
                })
                .collect()
        })
    }

    fn max_id(&self, name: &str) -> StoreResult<Option<i64>> {
        self.enter("max_id")?;
        self.with_collection(name, |col| col.rows.keys().next_back().copied())
    }

    fn min_id(&self, name: &str, range: IdRange) -> StoreResult<Option<i64>> {
        self.enter("min_id")?;
        if range.is_empty() {
            return Ok(None);
        }
        self.with_collection(name, |col| {
            col.rows
                .range(range.start..)
                .map(|(id, _)| *id)
                .next()
                .filter(|id| range.contains(*id))
        })
    }
}
