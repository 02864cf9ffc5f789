//! In-memory relational store backend.
//!
//! Tables live in a map behind a lock. Like the vector counterpart this is a
//! test double: it counts calls and can inject row and connection failures.

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use tracing::trace;

use super::super::traits::{RelationalStore, TableName};
use crate::error::{StoreError, StoreResult};
use crate::record::ChunkRecord;

const STORE: &str = "memory relational store";

#[derive(Debug, Default)]
struct MemoryTable {
    dimension: usize,
    rows: BTreeMap<i64, ChunkRecord>,
}

#[derive(Debug, Default)]
struct Faults {
    failing_inserts: HashSet<i64>,
    disconnect_at: Option<i64>,
    offline: bool,
}

/// In-memory relational store.
#[derive(Default)]
pub struct MemoryRelationalStore {
    tables: RwLock<BTreeMap<String, MemoryTable>>,
    faults: RwLock<Faults>,
    calls: AtomicUsize,
}

impl MemoryRelationalStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make inserts of `id` fail with a row error.
    pub fn with_failing_insert(self, id: i64) -> Self {
        self.faults
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .failing_inserts
            .insert(id);
        self
    }

    /// Drop the connection when inserting `id`; every later call fails too.
    pub fn with_disconnect_at(self, id: i64) -> Self {
        self.faults
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .disconnect_at = Some(id);
        self
    }

    /// Put rows into a table directly, creating it if needed.
    ///
    /// Does not count as a call.
    pub fn seed(&self, table: &TableName, dimension: usize, rows: Vec<ChunkRecord>) {
        let mut tables = self.tables.write().unwrap_or_else(|e| e.into_inner());
        let entry = tables
            .entry(table.as_str().to_string())
            .or_insert_with(|| MemoryTable {
                dimension,
                rows: BTreeMap::new(),
            });
        for row in rows {
            entry.rows.insert(row.id, row);
        }
    }

    /// Number of trait calls served so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Fetch a stored row.
    pub fn get(&self, table: &TableName, id: i64) -> Option<ChunkRecord> {
        self.tables
            .read()
            .ok()
            .and_then(|t| t.get(table.as_str()).and_then(|t| t.rows.get(&id).cloned()))
    }

    /// Primary keys stored in a table, ascending.
    pub fn ids(&self, table: &TableName) -> Vec<i64> {
        self.tables
            .read()
            .map(|t| {
                t.get(table.as_str())
                    .map(|t| t.rows.keys().copied().collect())
                    .unwrap_or_default()
            })
            .unwrap_or_default()
    }

    /// Embedding dimension the table was created with.
    pub fn dimension(&self, table: &TableName) -> Option<usize> {
        self.tables
            .read()
            .ok()
            .and_then(|t| t.get(table.as_str()).map(|t| t.dimension))
    }

    fn enter(&self, op: &str) -> StoreResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        trace!("memory relational store: {}", op);
        let faults = self
            .faults
            .read()
            .map_err(|e| StoreError::internal(format!("Failed to acquire read lock: {}", e)))?;
        if faults.offline {
            return Err(StoreError::connection(STORE, "connection lost"));
        }
        Ok(())
    }

    fn missing_table(table: &TableName) -> StoreError {
        StoreError::query(format!("table {} doesn't exist", table))
    }
}

impl RelationalStore for MemoryRelationalStore {
    fn table_exists(&self, table: &TableName) -> StoreResult<bool> {
        self.enter("table_exists")?;
        let tables = self
            .tables
            .read()
            .map_err(|e| StoreError::internal(format!("Failed to acquire read lock: {}", e)))?;
        Ok(tables.contains_key(table.as_str()))
    }

    fn create_table_if_missing(&self, table: &TableName, dimension: usize) -> StoreResult<bool> {
        self.enter("create_table_if_missing")?;
        let mut tables = self
            .tables
            .write()
            .map_err(|e| StoreError::internal(format!("Failed to acquire write lock: {}", e)))?;
        if tables.contains_key(table.as_str()) {
            return Ok(false);
        }
        if dimension == 0 {
            return Err(StoreError::TableCreation {
                table: table.to_string(),
                message: "embedding dimension must be positive".to_string(),
            });
        }
        tables.insert(
            table.as_str().to_string(),
            MemoryTable {
                dimension,
                rows: BTreeMap::new(),
            },
        );
        Ok(true)
    }

    fn exists(&self, table: &TableName, id: i64) -> StoreResult<bool> {
        self.enter("exists")?;
        let tables = self
            .tables
            .read()
            .map_err(|e| StoreError::internal(format!("Failed to acquire read lock: {}", e)))?;
        let t = tables
            .get(table.as_str())
            .ok_or_else(|| Self::missing_table(table))?;
        Ok(t.rows.contains_key(&id))
    }

    fn existing_ids(&self, table: &TableName, ids: &[i64]) -> StoreResult<HashSet<i64>> {
        self.enter("existing_ids")?;
        let tables = self
            .tables
            .read()
            .map_err(|e| StoreError::internal(format!("Failed to acquire read lock: {}", e)))?;
        let t = tables
            .get(table.as_str())
            .ok_or_else(|| Self::missing_table(table))?;
        Ok(ids
            .iter()
            .copied()
            .filter(|id| t.rows.contains_key(id))
            .collect())
    }

    fn insert(&self, table: &TableName, row: &ChunkRecord) -> StoreResult<()> {
        self.enter("insert")?;
        {
            let mut faults = self
                .faults
                .write()
                .map_err(|e| StoreError::internal(format!("Failed to acquire write lock: {}", e)))?;
            if faults.disconnect_at == Some(row.id) {
                faults.offline = true;
                return Err(StoreError::connection(STORE, "connection lost"));
            }
            if faults.failing_inserts.contains(&row.id) {
                return Err(StoreError::Insert {
                    id: row.id,
                    message: "injected insert failure".to_string(),
                });
            }
        }

        let mut tables = self
            .tables
            .write()
            .map_err(|e| StoreError::internal(format!("Failed to acquire write lock: {}", e)))?;
        let t = tables
            .get_mut(table.as_str())
            .ok_or_else(|| Self::missing_table(table))?;
        if t.rows.contains_key(&row.id) {
            return Err(StoreError::Duplicate { id: row.id });
        }
        if row.embedding.len() != t.dimension {
            return Err(StoreError::Insert {
                id: row.id,
                message: format!(
                    "expected {} embedding values, got {}",
                    t.dimension,
                    row.embedding.len()
                ),
            });
        }
        t.rows.insert(row.id, row.clone());
        Ok(())
    }

    fn count(&self, table: &TableName) -> StoreResult<u64> {
        self.enter("count")?;
        let tables = self
            .tables
            .read()
            .map_err(|e| StoreError::internal(format!("Failed to acquire read lock: {}", e)))?;
        let t = tables
            .get(table.as_str())
            .ok_or_else(|| Self::missing_table(table))?;
        Ok(t.rows.len() as u64)
    }
}
