//! Relational store backend implementations.
//!
//! ## Available Backends
//!
//! - `tidb` (default): TiDB over the MySQL protocol
//! - `memory`: In-memory store for tests

#[cfg(feature = "tidb")]
mod tidb;

#[cfg(feature = "memory")]
mod memory;

#[cfg(feature = "tidb")]
pub use self::tidb::{create_table_sql, vector_literal, TidbStore};

#[cfg(feature = "memory")]
pub use self::memory::MemoryRelationalStore;
