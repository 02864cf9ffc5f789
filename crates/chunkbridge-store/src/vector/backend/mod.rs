//! Vector store backend implementations.
//!
//! ## Available Backends
//!
//! - `milvus` (default): Milvus over its RESTful v2 API
//! - `memory`: In-memory store for tests

#[cfg(feature = "milvus")]
mod milvus;

#[cfg(feature = "memory")]
mod memory;

#[cfg(feature = "milvus")]
pub use self::milvus::{MilvusStore, MAX_QUERY_WINDOW};

#[cfg(feature = "memory")]
pub use self::memory::MemoryVectorStore;
