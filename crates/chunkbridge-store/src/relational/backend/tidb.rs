//! TiDB relational store backend.
//!
//! Uses `sqlx`'s MySQL driver behind a private current-thread tokio runtime,
//! so the [`RelationalStore`] surface stays synchronous. The pool holds a
//! single connection for the lifetime of the store.

use std::collections::HashSet;

use sqlx::mysql::{
    MySqlConnectOptions, MySqlDatabaseError, MySqlPool, MySqlPoolOptions, MySqlSslMode,
};
use tokio::runtime::Runtime;
use tracing::{debug, info, trace};

use super::super::traits::{quote_ident, RelationalStore, TableName};
use crate::config::TidbConfig;
use crate::error::{StoreError, StoreResult};
use crate::record::ChunkRecord;

const STORE: &str = "TiDB";

/// MySQL error number for "Unknown database".
const ER_BAD_DB_ERROR: u16 = 1049;

/// TiDB relational store.
pub struct TidbStore {
    pool: MySqlPool,
    runtime: Runtime,
}

impl TidbStore {
    /// Connect to TiDB, creating the configured database if it is missing.
    pub fn connect(config: &TidbConfig) -> StoreResult<Self> {
        debug!("Connecting to TiDB at {}", config.display_target());

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| StoreError::internal(format!("Failed to create runtime: {}", e)))?;

        let pool = match runtime.block_on(open_pool(config, true)) {
            Ok(pool) => pool,
            Err(err) if mysql_error_number(&err) == Some(ER_BAD_DB_ERROR) => {
                info!("Database '{}' not found, creating it", config.database);
                runtime.block_on(create_database(config))?;
                runtime
                    .block_on(open_pool(config, true))
                    .map_err(|e| classify(e, None))?
            }
            Err(err) => return Err(connect_error(err)),
        };

        Ok(Self { pool, runtime })
    }
}

impl Drop for TidbStore {
    fn drop(&mut self) {
        self.runtime.block_on(self.pool.close());
    }
}

async fn open_pool(config: &TidbConfig, with_database: bool) -> Result<MySqlPool, sqlx::Error> {
    let mut options = MySqlConnectOptions::new()
        .host(&config.host)
        .port(config.port)
        .username(&config.username)
        .password(&config.password)
        .ssl_mode(if config.enable_ssl {
            MySqlSslMode::VerifyIdentity
        } else {
            MySqlSslMode::Disabled
        });
    if with_database {
        options = options.database(&config.database);
    }

    MySqlPoolOptions::new()
        .max_connections(1)
        .acquire_timeout(config.connect_timeout)
        .connect_with(options)
        .await
}

async fn create_database(config: &TidbConfig) -> StoreResult<()> {
    let pool = open_pool(config, false).await.map_err(connect_error)?;
    let sql = format!(
        "CREATE DATABASE IF NOT EXISTS {}",
        quote_ident(&config.database)
    );
    let result = sqlx::query(&sql).execute(&pool).await;
    pool.close().await;
    result.map_err(|e| classify(e, None))?;
    Ok(())
}

fn connect_error(err: sqlx::Error) -> StoreError {
    match classify(err, None) {
        StoreError::Query { message } => StoreError::connection(STORE, message),
        other => other,
    }
}

fn mysql_error_number(err: &sqlx::Error) -> Option<u16> {
    match err {
        sqlx::Error::Database(db) => db
            .try_downcast_ref::<MySqlDatabaseError>()
            .map(MySqlDatabaseError::number),
        _ => None,
    }
}

/// Map a driver error onto the store taxonomy.
///
/// `row` is the primary key being written, if any; database errors on a
/// write become row errors, everything transport-related a connection error.
fn classify(err: sqlx::Error, row: Option<i64>) -> StoreError {
    match err {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::Protocol(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => StoreError::connection(STORE, err.to_string()),
        sqlx::Error::Database(ref db) => match row {
            Some(id) if db.is_unique_violation() => StoreError::Duplicate { id },
            Some(id) => StoreError::Insert {
                id,
                message: db.message().to_string(),
            },
            None => StoreError::query(db.message()),
        },
        other => match row {
            Some(id) => StoreError::Insert {
                id,
                message: other.to_string(),
            },
            None => StoreError::query(other.to_string()),
        },
    }
}

/// Render an embedding as a TiDB vector literal, e.g. `[0.1,-0.2]`.
pub fn vector_literal(values: &[f32]) -> String {
    let parts: Vec<String> = values.iter().map(|v| v.to_string()).collect();
    format!("[{}]", parts.join(","))
}

/// DDL for the chunk table.
pub fn create_table_sql(table: &TableName, dimension: usize) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {} (
            id BIGINT NOT NULL PRIMARY KEY,
            document_id BIGINT NOT NULL,
            chunk_index BIGINT NOT NULL,
            text LONGTEXT NOT NULL,
            source VARCHAR(2048) NOT NULL DEFAULT '',
            created_at VARCHAR(64) NOT NULL DEFAULT '',
            embedding VECTOR({}) NOT NULL
        )",
        table.quoted(),
        dimension
    )
}

impl RelationalStore for TidbStore {
    fn table_exists(&self, table: &TableName) -> StoreResult<bool> {
        let found = self
            .runtime
            .block_on(
                sqlx::query_scalar::<_, i64>(
                    "SELECT COUNT(*) FROM information_schema.tables \
                     WHERE table_schema = DATABASE() AND table_name = ?",
                )
                .bind(table.as_str())
                .fetch_one(&self.pool),
            )
            .map_err(|e| classify(e, None))?;
        Ok(found > 0)
    }

    fn create_table_if_missing(&self, table: &TableName, dimension: usize) -> StoreResult<bool> {
        if self.table_exists(table)? {
            debug!("Table {} already exists", table);
            return Ok(false);
        }
        if dimension == 0 {
            return Err(StoreError::TableCreation {
                table: table.to_string(),
                message: "embedding dimension must be positive".to_string(),
            });
        }

        info!("Creating table {} (embedding dim {})", table, dimension);
        let sql = create_table_sql(table, dimension);
        self.runtime
            .block_on(sqlx::query(&sql).execute(&self.pool))
            .map_err(|e| match classify(e, None) {
                conn @ StoreError::Connection { .. } => conn,
                other => StoreError::TableCreation {
                    table: table.to_string(),
                    message: other.to_string(),
                },
            })?;
        Ok(true)
    }

    fn exists(&self, table: &TableName, id: i64) -> StoreResult<bool> {
        let sql = format!("SELECT 1 FROM {} WHERE id = ? LIMIT 1", table.quoted());
        let row = self
            .runtime
            .block_on(
                sqlx::query_scalar::<_, i64>(&sql)
                    .bind(id)
                    .fetch_optional(&self.pool),
            )
            .map_err(|e| classify(e, None))?;
        Ok(row.is_some())
    }

    fn existing_ids(&self, table: &TableName, ids: &[i64]) -> StoreResult<HashSet<i64>> {
        if ids.is_empty() {
            return Ok(HashSet::new());
        }
        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            "SELECT id FROM {} WHERE id IN ({})",
            table.quoted(),
            placeholders
        );
        trace!("Checking {} ids against {}", ids.len(), table);

        let mut query = sqlx::query_scalar::<_, i64>(&sql);
        for id in ids {
            query = query.bind(*id);
        }
        let found = self
            .runtime
            .block_on(query.fetch_all(&self.pool))
            .map_err(|e| classify(e, None))?;
        Ok(found.into_iter().collect())
    }

    fn insert(&self, table: &TableName, row: &ChunkRecord) -> StoreResult<()> {
        let sql = format!(
            "INSERT INTO {} (id, document_id, chunk_index, text, source, created_at, embedding) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
            table.quoted()
        );
        let embedding = vector_literal(&row.embedding);
        self.runtime
            .block_on(
                sqlx::query(&sql)
                    .bind(row.id)
                    .bind(row.document_id)
                    .bind(row.chunk_index)
                    .bind(row.text.as_str())
                    .bind(row.source.as_str())
                    .bind(row.created_at.as_str())
                    .bind(embedding.as_str())
                    .execute(&self.pool),
            )
            .map_err(|e| classify(e, Some(row.id)))?;
        Ok(())
    }

    fn count(&self, table: &TableName) -> StoreResult<u64> {
        let sql = format!("SELECT COUNT(*) FROM {}", table.quoted());
        let count = self
            .runtime
            .block_on(sqlx::query_scalar::<_, i64>(&sql).fetch_one(&self.pool))
            .map_err(|e| classify(e, None))?;
        Ok(u64::try_from(count).unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vector_literal() {
        assert_eq!(vector_literal(&[0.5, -1.0, 0.25]), "[0.5,-1,0.25]");
        assert_eq!(vector_literal(&[]), "[]");
    }

    #[test]
    fn test_create_table_sql() {
        let table = TableName::new("chunks").unwrap();
        let sql = create_table_sql(&table, 1536);
        assert!(sql.contains("CREATE TABLE IF NOT EXISTS `chunks`"));
        assert!(sql.contains("id BIGINT NOT NULL PRIMARY KEY"));
        assert!(sql.contains("embedding VECTOR(1536) NOT NULL"));
    }

    #[test]
    fn test_classify_transport_errors() {
        assert!(classify(sqlx::Error::PoolTimedOut, None).is_connection());
        assert!(classify(sqlx::Error::PoolClosed, Some(3)).is_connection());
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "broken pipe");
        assert!(classify(sqlx::Error::Io(io), Some(3)).is_connection());
    }

    #[test]
    fn test_classify_row_errors() {
        let err = classify(sqlx::Error::RowNotFound, Some(9));
        assert!(matches!(err, StoreError::Insert { id: 9, .. }));
        let err = classify(sqlx::Error::RowNotFound, None);
        assert!(matches!(err, StoreError::Query { .. }));
    }
}
