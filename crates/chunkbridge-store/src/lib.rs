//! # chunkbridge-store
//!
//! Infrastructure layer for chunkbridge - the vector store the chunks live in
//! and the relational store they are migrated to.
//!
//! Store clients are kept out of `chunkbridge-core` so the generator,
//! inspector and migrator only ever see the [`VectorStore`] and
//! [`RelationalStore`] traits, and tests can run against in-memory doubles.
//!
//! ## Architecture
//!
//! ```text
//! chunkbridge-cli → chunkbridge-core → (traits)
//!                          ↑
//!                 chunkbridge-store (Milvus, TiDB, in-memory)
//! ```
//!
//! ## Features
//!
//! - `milvus` (default): Milvus RESTful v2 client
//! - `tidb` (default): TiDB client over the MySQL protocol
//! - `memory`: In-memory stores for testing
//!
//! ## Modules
//!
//! - `vector`: Collection schema, id ranges and vector store backends
//! - `relational`: Destination table naming and relational store backends
//! - `config`: Connection settings for both stores
//! - `record`: The chunk record shared by both sides

pub mod config;
pub mod error;
pub mod record;
pub mod relational;
pub mod vector;

pub use error::{StoreError, StoreResult};
pub use record::ChunkRecord;
pub use relational::RelationalStore;
pub use vector::VectorStore;
