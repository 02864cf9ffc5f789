//! Relational store module for chunkbridge-store.
//!
//! The destination side of the migrator: one table of chunk rows keyed by
//! `id`, with the embedding stored in a native vector column.
//!
//! ## Usage
//!
//! ```ignore
//! use chunkbridge_store::relational::{RelationalStore, TableName, TidbStore};
//!
//! let store = TidbStore::connect(&config)?;
//! let table = TableName::new("chunks")?;
//! store.create_table_if_missing(&table, 1536)?;
//! store.insert(&table, &row)?;
//! ```

mod backend;
mod traits;

pub use traits::{quote_ident, RelationalStore, TableName};

#[cfg(feature = "tidb")]
pub use backend::{create_table_sql, vector_literal, TidbStore};

#[cfg(feature = "memory")]
pub use backend::MemoryRelationalStore;
