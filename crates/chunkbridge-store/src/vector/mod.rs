//! Vector store module for chunkbridge-store.
//!
//! The source side of every tool: a collection of chunk records with an
//! embedding field, addressed by integer primary key.
//!
//! ## Usage
//!
//! ```ignore
//! use chunkbridge_store::vector::{IdRange, MilvusStore, QueryRequest, VectorStore};
//!
//! let store = MilvusStore::connect(&config)?;
//! let page = store.query("chunk", &QueryRequest::new(IdRange::new(0, 200), 200))?;
//! ```

mod backend;
mod schema;
mod traits;

pub use schema::{
    CollectionDescription, CollectionSchema, FieldSchema, FieldType, IdRange, OutputFields,
    CREATED_AT_MAX_LENGTH, DEFAULT_EMBEDDING_DIM, SOURCE_MAX_LENGTH, TEXT_MAX_LENGTH,
};
pub use traits::{QueryRequest, VectorStore};

#[cfg(feature = "milvus")]
pub use backend::{MilvusStore, MAX_QUERY_WINDOW};

#[cfg(feature = "memory")]
pub use backend::MemoryVectorStore;
