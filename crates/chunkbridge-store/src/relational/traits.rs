//! Relational store trait and table naming.

use std::collections::HashSet;

use crate::error::{StoreError, StoreResult};
use crate::record::ChunkRecord;

// ============================================================================
// TableName
// ============================================================================

/// Destination table identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableName {
    table: String,
}

impl TableName {
    /// Builds a new table identifier.
    pub fn new(table: impl Into<String>) -> StoreResult<Self> {
        let table = table.into();
        if table.trim().is_empty() {
            return Err(StoreError::Config {
                message: "table name is required".to_string(),
            });
        }
        if table.contains('\0') {
            return Err(StoreError::Config {
                message: format!("table name {:?} contains a NUL byte", table),
            });
        }
        Ok(Self { table })
    }

    /// Returns the raw table string.
    pub fn as_str(&self) -> &str {
        &self.table
    }

    /// Table reference with a quoted identifier.
    pub fn quoted(&self) -> String {
        quote_ident(&self.table)
    }
}

impl std::fmt::Display for TableName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.table)
    }
}

/// Quotes MySQL identifiers, escaping embedded backticks.
pub fn quote_ident(input: &str) -> String {
    format!("`{}`", input.replace('`', "``"))
}

// ============================================================================
// RelationalStore Trait
// ============================================================================

/// Operations the migrator needs from the destination database.
///
/// Inserts never overwrite: a row whose primary key is already present must
/// fail with [`StoreError::Duplicate`], and transport failures must surface
/// as [`StoreError::Connection`].
pub trait RelationalStore: Send + Sync {
    /// Check whether a table exists.
    fn table_exists(&self, table: &TableName) -> StoreResult<bool>;

    /// Create the chunk table with an embedding column of `dimension` values.
    ///
    /// Returns `true` when the table was created by this call.
    fn create_table_if_missing(&self, table: &TableName, dimension: usize) -> StoreResult<bool>;

    /// Whether a row with this primary key exists.
    fn exists(&self, table: &TableName, id: i64) -> StoreResult<bool>;

    /// The subset of `ids` already present in the table.
    fn existing_ids(&self, table: &TableName, ids: &[i64]) -> StoreResult<HashSet<i64>> {
        let mut found = HashSet::new();
        for &id in ids {
            if self.exists(table, id)? {
                found.insert(id);
            }
        }
        Ok(found)
    }

    /// Insert one row.
    fn insert(&self, table: &TableName, row: &ChunkRecord) -> StoreResult<()>;

    /// Number of rows in the table.
    fn count(&self, table: &TableName) -> StoreResult<u64>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_name_quoting() {
        let table = TableName::new("chunks").unwrap();
        assert_eq!(table.quoted(), "`chunks`");
        assert_eq!(table.as_str(), "chunks");

        let table = TableName::new("odd`name").unwrap();
        assert_eq!(table.quoted(), "`odd``name`");
    }

    #[test]
    fn test_table_name_validation() {
        assert!(TableName::new("").is_err());
        assert!(TableName::new("   ").is_err());
        assert!(TableName::new("a\0b").is_err());
    }
}
