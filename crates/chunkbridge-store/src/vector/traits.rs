//! Vector store trait.
//!
//! This module defines the abstraction the tools use to talk to the source
//! vector database.

use crate::error::StoreResult;
use crate::record::ChunkRecord;

use super::schema::{CollectionDescription, CollectionSchema, IdRange, OutputFields};

// ============================================================================
// QueryRequest
// ============================================================================

/// A bounded primary-key range query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryRequest {
    /// Primary key interval to read.
    pub range: IdRange,

    /// Fields to return.
    pub fields: OutputFields,

    /// Maximum number of rows.
    pub limit: usize,
}

impl QueryRequest {
    /// Create a query for `range` returning scalar fields only.
    pub fn new(range: IdRange, limit: usize) -> Self {
        Self {
            range,
            fields: OutputFields::Scalars,
            limit,
        }
    }

    /// Set the output fields.
    pub fn with_fields(mut self, fields: OutputFields) -> Self {
        self.fields = fields;
        self
    }
}

// ============================================================================
// VectorStore Trait
// ============================================================================

/// Operations the tools need from the source vector database.
///
/// ## Implementation Notes
///
/// - Calls block until the store answers.
/// - `query` returns at most `limit` rows, all inside the requested range,
///   in no particular order.
/// - Transport failures must surface as [`StoreError::Connection`](crate::StoreError::Connection).
pub trait VectorStore: Send + Sync {
    /// Check whether a collection exists.
    fn has_collection(&self, name: &str) -> StoreResult<bool>;

    /// Drop a collection. Dropping a missing collection is not an error.
    fn drop_collection(&self, name: &str) -> StoreResult<()>;

    /// Create a collection with the given schema and a vector index on the
    /// embedding field.
    fn create_collection(&self, name: &str, schema: &CollectionSchema) -> StoreResult<()>;

    /// Describe a collection's schema.
    fn describe_collection(&self, name: &str) -> StoreResult<CollectionDescription>;

    /// Load a collection into memory so it can be queried.
    fn load_collection(&self, _name: &str) -> StoreResult<()> {
        Ok(())
    }

    /// Persist buffered writes so statistics reflect them.
    fn flush(&self, _name: &str) -> StoreResult<()> {
        Ok(())
    }

    /// Number of rows in a collection.
    fn count(&self, name: &str) -> StoreResult<u64>;

    /// Insert rows. Returns the number of rows the store accepted.
    fn insert(&self, name: &str, rows: &[ChunkRecord]) -> StoreResult<usize>;

    /// Read rows whose primary key falls in `request.range`.
    fn query(&self, name: &str, request: &QueryRequest) -> StoreResult<Vec<ChunkRecord>>;

    /// Highest primary key in the collection, or `None` if it is empty.
    fn max_id(&self, name: &str) -> StoreResult<Option<i64>>;

    /// Lowest primary key inside `range`, or `None` if no row falls in it.
    fn min_id(&self, name: &str, range: IdRange) -> StoreResult<Option<i64>>;
}
