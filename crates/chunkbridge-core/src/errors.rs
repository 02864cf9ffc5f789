//! Error types for chunkbridge-core.

use chunkbridge_store::StoreError;
use thiserror::Error;

use crate::migrate::MigrationSummary;

/// Result type alias for chunkbridge-core operations.
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Process exit code for argument errors.
pub const EXIT_USAGE: u8 = 2;

/// Process exit code for every other fatal error.
pub const EXIT_FAILURE: u8 = 1;

/// Domain-specific errors for chunkbridge operations.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// A store could not be reached.
    #[error("Connection to {store} failed: {message}")]
    Connection {
        /// Which store.
        store: String,
        /// Driver message.
        message: String,
    },

    /// Required environment variables are not set.
    #[error("Missing required environment variables: {}", .vars.join(", "))]
    MissingEnv {
        /// Names of the missing variables, in lookup order.
        vars: Vec<String>,
    },

    /// A configuration value could not be used.
    #[error("Invalid configuration: {message}. {hint}")]
    InvalidConfiguration {
        /// Description of the invalid value.
        message: String,
        /// Actionable hint on how to fix it.
        hint: String,
    },

    /// An option value is out of range.
    ///
    /// Always detected before any store is contacted.
    #[error("{message}")]
    InvalidArgument {
        message: String,
        hint: Option<String>,
    },

    /// The source collection does not exist.
    #[error("Collection `{0}` not found.")]
    CollectionNotFound(String),

    /// The destination table could not be created.
    #[error("Failed to create table `{table}`: {message}")]
    TableCreation { table: String, message: String },

    /// A migration stopped on a connection-level failure.
    ///
    /// Carries the counters accumulated so far so the caller can report them
    /// and resume after `last_processed_id`.
    #[error("Migration aborted: {source}")]
    MigrationAborted {
        summary: Box<MigrationSummary>,
        last_processed_id: Option<i64>,
        source: StoreError,
    },

    /// Any other store failure.
    #[error(transparent)]
    Store(StoreError),
}

impl BridgeError {
    /// Create an invalid-argument error without a hint.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
            hint: None,
        }
    }

    /// Create an invalid-argument error with a hint.
    pub fn invalid_argument_with_hint(message: impl Into<String>, hint: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
            hint: Some(hint.into()),
        }
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::InvalidArgument { .. } => EXIT_USAGE,
            _ => EXIT_FAILURE,
        }
    }

    /// Suggested next step for the user, if there is one.
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::MissingEnv { .. } => {
                Some("Set them in the environment or in a .env file (see --env-file)".to_string())
            }
            Self::InvalidArgument { hint, .. } => hint.clone(),
            Self::InvalidConfiguration { hint, .. } => Some(hint.clone()),
            Self::CollectionNotFound(_) => {
                Some("Check --collection, or create it with chunk-generate".to_string())
            }
            Self::MigrationAborted {
                last_processed_id: Some(id),
                ..
            } => Some(format!("Resume with --start {}", id.saturating_add(1))),
            Self::MigrationAborted {
                last_processed_id: None,
                summary,
                ..
            } => Some(format!("Resume with --start {}", summary.start)),
            _ => None,
        }
    }
}

impl From<StoreError> for BridgeError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Connection { store, message } => Self::Connection {
                store: store.to_string(),
                message,
            },
            StoreError::CollectionNotFound { name } => Self::CollectionNotFound(name),
            StoreError::TableCreation { table, message } => Self::TableCreation { table, message },
            StoreError::Config { message } => Self::InvalidConfiguration {
                message,
                hint: "Check the command-line options".to_string(),
            },
            other => Self::Store(other),
        }
    }
}
