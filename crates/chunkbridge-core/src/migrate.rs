//! Range migrator.
//!
//! Copies chunk records with `start <= id < end` from a vector store
//! collection into a relational table. Rows whose primary key already exists
//! in the destination are skipped and never rewritten, so re-running a range
//! is a no-op once it has completed.
//!
//! ## Paging
//!
//! The range is walked in id windows `[w, min(w + page_size, end))` rather
//! than with offsets, so every page is a bounded filter query and the run can
//! resume from any id. After an empty window the walk jumps to the next id
//! the source holds, so sparse id spaces cost queries per row, not per id.
//!
//! ## Error Handling
//!
//! A failed row insert is counted and logged and the run continues. A store
//! that stops answering aborts the run with [`BridgeError::MigrationAborted`],
//! which carries the counters so far and the last processed id.

use std::time::{Duration, Instant};

use chunkbridge_store::relational::TableName;
use chunkbridge_store::vector::{IdRange, OutputFields, QueryRequest, DEFAULT_EMBEDDING_DIM};
use chunkbridge_store::{RelationalStore, StoreError, VectorStore};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::errors::{BridgeError, BridgeResult};
use crate::generate::{duration_ms, DEFAULT_COLLECTION};

// ============================================================================
// Constants
// ============================================================================

pub const DEFAULT_TABLE: &str = "chunks";
pub const DEFAULT_PAGE_SIZE: usize = 200;

/// Largest page a single vector store query may return.
pub const MAX_PAGE_SIZE: usize = 16_384;

// ============================================================================
// Types
// ============================================================================

/// Options for [`migrate`].
#[derive(Debug, Clone)]
pub struct MigrateOptions {
    /// Inclusive lower id bound.
    pub start: i64,
    /// Exclusive upper id bound; `None` reads to the highest source id.
    pub end: Option<i64>,
    pub collection: String,
    pub table: String,
    pub page_size: usize,
    /// Report what would be inserted without writing.
    pub dry_run: bool,
}

impl Default for MigrateOptions {
    fn default() -> Self {
        Self {
            start: 0,
            end: None,
            collection: DEFAULT_COLLECTION.to_string(),
            table: DEFAULT_TABLE.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            dry_run: false,
        }
    }
}

impl MigrateOptions {
    /// Check option values and build the table name; never touches a store.
    pub fn validate(&self) -> BridgeResult<TableName> {
        if let Some(end) = self.end {
            if end < self.start {
                return Err(BridgeError::invalid_argument_with_hint(
                    format!("--end ({}) must be >= --start ({})", end, self.start),
                    "Omit --end to read to the last id",
                ));
            }
        }
        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(BridgeError::invalid_argument(format!(
                "--page-size must be between 1 and {}",
                MAX_PAGE_SIZE
            )));
        }
        if self.collection.trim().is_empty() {
            return Err(BridgeError::invalid_argument(
                "--milvus-collection must not be empty",
            ));
        }
        TableName::new(self.table.as_str())
            .map_err(|e| BridgeError::invalid_argument(format!("--tidb-table: {}", e)))
    }
}

/// Counters of a migration run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationSummary {
    pub start: i64,
    /// Effective exclusive end.
    pub end: i64,
    pub scanned: u64,
    pub inserted: u64,
    /// Already present in the destination.
    pub skipped: u64,
    pub failed: u64,
    /// Dry run only: rows absent from the destination.
    pub would_insert: u64,
    pub pages: u64,
    pub last_processed_id: Option<i64>,
    pub dry_run: bool,
    #[serde(with = "duration_ms")]
    pub elapsed: Duration,
}

impl MigrationSummary {
    /// A summary with every counter at zero.
    pub fn empty(start: i64, end: i64, dry_run: bool) -> Self {
        Self {
            start,
            end,
            scanned: 0,
            inserted: 0,
            skipped: 0,
            failed: 0,
            would_insert: 0,
            pages: 0,
            last_processed_id: None,
            dry_run,
            elapsed: Duration::ZERO,
        }
    }

    /// Number of ids in the effective range.
    pub fn span(&self) -> u64 {
        u64::try_from(i128::from(self.end) - i128::from(self.start)).unwrap_or(0)
    }
}

/// Progress after each page.
#[derive(Debug, Clone, Copy)]
pub struct PageProgress<'a> {
    pub window: IdRange,
    pub summary: &'a MigrationSummary,
}

// ============================================================================
// Public Functions
// ============================================================================

/// Migrate `[options.start, options.end)` from `source` into `dest`.
pub fn migrate<F>(
    source: &dyn VectorStore,
    dest: &dyn RelationalStore,
    options: &MigrateOptions,
    mut on_page: F,
) -> BridgeResult<MigrationSummary>
where
    F: FnMut(&PageProgress<'_>),
{
    let table = options.validate()?;
    let started = Instant::now();
    let start = options.start;

    if options.end == Some(start) {
        debug!("Empty range [{}, {}), nothing to do", start, start);
        return Ok(MigrationSummary::empty(start, start, options.dry_run));
    }

    let collection = options.collection.as_str();
    if !source.has_collection(collection)? {
        return Err(BridgeError::CollectionNotFound(collection.to_string()));
    }
    source.load_collection(collection)?;
    let dim = source
        .describe_collection(collection)?
        .schema
        .embedding_dim()
        .unwrap_or(DEFAULT_EMBEDDING_DIM);

    let end = match options.end {
        Some(end) => end,
        None => match source.max_id(collection)? {
            Some(max) => max.saturating_add(1),
            None => start,
        },
    };
    if end <= start {
        info!("Source {} has no ids at or above {}", collection, start);
        let mut summary = MigrationSummary::empty(start, start, options.dry_run);
        summary.elapsed = started.elapsed();
        return Ok(summary);
    }

    // Dry runs never create the table; a missing one means every row is absent.
    let table_present = if options.dry_run {
        dest.table_exists(&table)?
    } else {
        dest.create_table_if_missing(&table, dim).map_err(|e| match e {
            StoreError::TableCreation { .. } | StoreError::Connection { .. } => {
                BridgeError::from(e)
            }
            other => BridgeError::TableCreation {
                table: table.to_string(),
                message: other.to_string(),
            },
        })?;
        true
    };

    info!(
        collection,
        table = %table,
        start,
        end,
        page_size = options.page_size,
        dry_run = options.dry_run,
        "Migrating range"
    );

    let mut summary = MigrationSummary::empty(start, end, options.dry_run);
    let run = Run {
        source,
        dest,
        table: &table,
        collection,
        table_present,
        dry_run: options.dry_run,
    };

    let page = i64::try_from(options.page_size).unwrap_or(i64::MAX);
    let mut window_start = start;
    while window_start < end {
        let window_end = window_start.saturating_add(page).min(end);
        let window = IdRange::new(window_start, window_end);

        let found = match run.page(window, options.page_size, &mut summary) {
            Ok(found) => found,
            Err(source_err) => return Err(abort(summary, started, window, source_err)),
        };

        on_page(&PageProgress {
            window,
            summary: &summary,
        });

        window_start = if found || window_end >= end {
            window_end
        } else {
            // Skip the gap up to the next id the source actually holds.
            match run.next_id(IdRange::new(window_end, end)) {
                Ok(Some(next)) => {
                    debug!("No ids in {}, resuming at {}", window, next);
                    next.max(window_end)
                }
                Ok(None) => end,
                Err(source_err) => return Err(abort(summary, started, window, source_err)),
            }
        };
    }

    summary.elapsed = started.elapsed();
    info!(
        scanned = summary.scanned,
        inserted = summary.inserted,
        skipped = summary.skipped,
        failed = summary.failed,
        "Migration finished"
    );
    Ok(summary)
}

// ============================================================================
// Internal Helpers
// ============================================================================

fn abort(
    mut summary: MigrationSummary,
    started: Instant,
    window: IdRange,
    source: StoreError,
) -> BridgeError {
    summary.elapsed = started.elapsed();
    warn!("Aborting migration in window {}: {}", window, source);
    BridgeError::MigrationAborted {
        last_processed_id: summary.last_processed_id,
        summary: Box::new(summary),
        source,
    }
}

struct Run<'a> {
    source: &'a dyn VectorStore,
    dest: &'a dyn RelationalStore,
    table: &'a TableName,
    collection: &'a str,
    table_present: bool,
    dry_run: bool,
}

impl Run<'_> {
    /// Lowest source id inside `range`.
    fn next_id(&self, range: IdRange) -> Result<Option<i64>, StoreError> {
        self.source.min_id(self.collection, range)
    }

    /// Process one window; returns whether it held any rows. An `Err` aborts
    /// the run.
    fn page(
        &self,
        window: IdRange,
        limit: usize,
        summary: &mut MigrationSummary,
    ) -> Result<bool, StoreError> {
        let request = QueryRequest::new(window, limit).with_fields(OutputFields::All);
        let mut rows = self.source.query(self.collection, &request)?;
        rows.retain(|r| window.contains(r.id));
        rows.sort_by_key(|r| r.id);
        summary.pages += 1;

        if rows.is_empty() {
            return Ok(false);
        }

        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        let existing = if self.table_present {
            self.dest.existing_ids(self.table, &ids)?
        } else {
            Default::default()
        };
        debug!(
            "Window {}: {} rows, {} already present",
            window,
            rows.len(),
            existing.len()
        );

        for row in &rows {
            summary.scanned += 1;
            if existing.contains(&row.id) {
                summary.skipped += 1;
            } else if self.dry_run {
                summary.would_insert += 1;
            } else {
                match self.dest.insert(self.table, row) {
                    Ok(()) => summary.inserted += 1,
                    Err(StoreError::Duplicate { id }) => {
                        debug!("Row {} inserted concurrently, skipping", id);
                        summary.skipped += 1;
                    }
                    Err(e) if e.is_connection() => return Err(e),
                    Err(e) => {
                        warn!(id = row.id, "Row insert failed: {}", e);
                        summary.failed += 1;
                    }
                }
            }
            summary.last_processed_id = Some(row.id);
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation() {
        let bad_range = MigrateOptions {
            start: 5,
            end: Some(3),
            ..MigrateOptions::default()
        };
        assert_eq!(bad_range.validate().unwrap_err().exit_code(), 2);

        let bad_page = MigrateOptions {
            page_size: 0,
            ..MigrateOptions::default()
        };
        assert!(bad_page.validate().is_err());

        let bad_table = MigrateOptions {
            table: String::new(),
            ..MigrateOptions::default()
        };
        assert!(bad_table.validate().is_err());

        let table = MigrateOptions::default().validate().unwrap();
        assert_eq!(table.as_str(), "chunks");
    }

    #[test]
    fn test_summary_span() {
        assert_eq!(MigrationSummary::empty(5, 10, false).span(), 5);
        assert_eq!(MigrationSummary::empty(10, 10, false).span(), 0);
        assert_eq!(
            MigrationSummary::empty(i64::MIN, i64::MAX, false).span(),
            u64::MAX
        );
    }

    #[test]
    fn test_summary_json() {
        let json = serde_json::to_value(MigrationSummary::empty(0, 3, true)).unwrap();
        assert_eq!(json["wouldInsert"], 0);
        assert_eq!(json["dryRun"], true);
        assert_eq!(json["elapsed"], 0);
    }
}
