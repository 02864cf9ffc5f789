//! Error types for chunkbridge-store.

use thiserror::Error;

/// Result type alias for chunkbridge-store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    // ========================================================================
    // Transport errors
    // ========================================================================
    /// The store could not be reached, or the connection dropped mid-call.
    #[error("Connection to {store} failed: {message}")]
    Connection {
        store: &'static str,
        message: String,
    },

    /// The store answered with an error payload.
    #[error("{store} returned error {code}: {message}")]
    Api {
        store: &'static str,
        code: i64,
        message: String,
    },

    // ========================================================================
    // Schema errors
    // ========================================================================
    /// Collection does not exist in the vector store.
    #[error("Collection not found: {name}")]
    CollectionNotFound { name: String },

    /// Destination table could not be created.
    #[error("Failed to create table {table}: {message}")]
    TableCreation { table: String, message: String },

    /// Vector dimension mismatch.
    #[error("Vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    // ========================================================================
    // Row errors
    // ========================================================================
    /// A single row could not be inserted.
    #[error("Failed to insert row {id}: {message}")]
    Insert { id: i64, message: String },

    /// A row with the same primary key already exists.
    #[error("Row {id} already exists")]
    Duplicate { id: i64 },

    /// A read query failed.
    #[error("Query failed: {message}")]
    Query { message: String },

    /// A row or response could not be decoded.
    #[error("Failed to decode {what}: {message}")]
    Decode { what: String, message: String },

    // ========================================================================
    // General errors
    // ========================================================================
    /// Configuration error.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// JSON error wrapper.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic internal error.
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl StoreError {
    /// Create a connection error.
    pub fn connection(store: &'static str, message: impl Into<String>) -> Self {
        Self::Connection {
            store,
            message: message.into(),
        }
    }

    /// Create an API error.
    pub fn api(store: &'static str, code: i64, message: impl Into<String>) -> Self {
        Self::Api {
            store,
            code,
            message: message.into(),
        }
    }

    /// Create a query error.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }

    /// Create a decode error.
    pub fn decode(what: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            what: what.into(),
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Whether the error means the store itself is unreachable.
    ///
    /// Callers abort on these instead of counting them against a single row.
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection { .. })
    }
}
