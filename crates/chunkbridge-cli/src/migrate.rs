//! `chunk-migrate`: copy an id range from a Milvus collection into TiDB.

use std::process::ExitCode;

use anyhow::Result;
use chunkbridge_core::config::{migration_config, process_env};
use chunkbridge_core::generate::DEFAULT_COLLECTION;
use chunkbridge_core::migrate::{DEFAULT_PAGE_SIZE, DEFAULT_TABLE};
use chunkbridge_core::{migrate, BridgeError, MigrateOptions, MigrationSummary};
use chunkbridge_store::relational::TidbStore;
use chunkbridge_store::vector::MilvusStore;
use clap::Parser;
use tracing::debug;

use crate::ui::format::{format_duration, format_thousands};
use crate::ui::table::render_counters_table;
use crate::ui::{Progress, ProgressMode, Style, Tag};
use crate::{report_failure, CommonArgs, VERSION};

/// Migrate chunk records with start <= id < end from Milvus into TiDB.
#[derive(Parser, Debug)]
#[command(name = "chunk-migrate", version = VERSION, about, long_about = None)]
pub struct MigrateCli {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Inclusive lower id bound
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub start: i64,

    /// Exclusive upper id bound (default: one past the highest source id)
    #[arg(long, allow_negative_numbers = true)]
    pub end: Option<i64>,

    /// Source collection
    #[arg(long, default_value = DEFAULT_COLLECTION)]
    pub milvus_collection: String,

    /// Destination table
    #[arg(long, default_value = DEFAULT_TABLE)]
    pub tidb_table: String,

    /// Ids per page
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
    pub page_size: usize,

    /// Report what would be inserted without writing
    #[arg(long)]
    pub dry_run: bool,

    /// Use TLS for the TiDB connection (default)
    #[arg(long, overrides_with = "no_ssl")]
    pub ssl: bool,

    /// Connect to TiDB without TLS
    #[arg(long, overrides_with = "ssl")]
    pub no_ssl: bool,
}

impl MigrateCli {
    pub fn options(&self) -> MigrateOptions {
        MigrateOptions {
            start: self.start,
            end: self.end,
            collection: self.milvus_collection.clone(),
            table: self.tidb_table.clone(),
            page_size: self.page_size,
            dry_run: self.dry_run,
        }
    }

    /// TLS unless `--no-ssl` was the last of the pair given.
    pub fn enable_ssl(&self) -> bool {
        !self.no_ssl
    }
}

/// Entry point of the `chunk-migrate` binary.
pub fn run() -> ExitCode {
    let cli = MigrateCli::parse();
    let style = cli.common.init();

    match execute(&cli, &style) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if let Some(BridgeError::MigrationAborted { summary, .. }) =
                err.downcast_ref::<BridgeError>()
            {
                print_summary(&style, summary);
            }
            report_failure(&style, &err)
        }
    }
}

fn execute(cli: &MigrateCli, style: &Style) -> Result<()> {
    let options = cli.options();
    options.validate()?;

    cli.common.load_env()?;
    let (milvus, tidb) = migration_config(process_env, cli.enable_ssl())?;
    debug!("Connecting to Milvus at {}", milvus.base_url());
    let source = MilvusStore::connect(&milvus).map_err(BridgeError::from)?;
    debug!("Connecting to TiDB at {}:{}", tidb.host, tidb.port);
    let dest = TidbStore::connect(&tidb).map_err(BridgeError::from)?;

    let mode = ProgressMode::detect(cli.common.quiet, false);
    let progress = Progress::bar(0, "Migrating", mode);
    let result = migrate(&source, &dest, &options, |p| {
        progress.set_length(p.summary.span());
        progress.set_message(&format!("window {}", p.window));
        let done = i128::from(p.window.end.unwrap_or(p.summary.end)) - i128::from(p.summary.start);
        progress.set_position(u64::try_from(done).unwrap_or(0));
    });
    progress.finish_clear();

    print_summary(style, &result?);
    Ok(())
}

/// Text layout of a migration summary.
pub fn render_summary(style: &Style, summary: &MigrationSummary) -> String {
    let mut counters = vec![
        ("scanned", summary.scanned),
        ("inserted", summary.inserted),
        ("skipped", summary.skipped),
        ("failed", summary.failed),
    ];
    if summary.dry_run {
        counters.push(("would insert", summary.would_insert));
    }

    let range = format!("[{}, {})", summary.start, summary.end);
    let headline = if summary.dry_run {
        style.status(Tag::DryRun, &format!("Range {} checked, nothing written", range))
    } else {
        style.status(Tag::Ok, &format!("Range {} migrated", range))
    };

    let last = summary
        .last_processed_id
        .map(|id| id.to_string())
        .unwrap_or_else(|| "none".to_string());

    let mut lines = vec![headline, render_counters_table(&counters)];
    if summary.failed > 0 {
        lines.push(style.status(
            Tag::Warn,
            &style.alert(&format!(
                "{} rows failed to insert",
                format_thousands(summary.failed)
            )),
        ));
    }
    lines.push(style.detail("Pages", &format_thousands(summary.pages)));
    lines.push(style.detail("Last processed id", &last));
    lines.push(style.detail("Elapsed", &format_duration(summary.elapsed)));
    lines.join("\n")
}

fn print_summary(style: &Style, summary: &MigrationSummary) {
    println!("{}", render_summary(style, summary));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = MigrateCli::try_parse_from(["chunk-migrate"]).unwrap();
        let options = cli.options();
        assert_eq!(options.start, 0);
        assert_eq!(options.end, None);
        assert_eq!(options.collection, "chunk");
        assert_eq!(options.table, "chunks");
        assert_eq!(options.page_size, 200);
        assert!(cli.enable_ssl());
    }

    #[test]
    fn test_ssl_toggle_last_wins() {
        let cli = MigrateCli::try_parse_from(["chunk-migrate", "--no-ssl"]).unwrap();
        assert!(!cli.enable_ssl());

        let cli = MigrateCli::try_parse_from(["chunk-migrate", "--no-ssl", "--ssl"]).unwrap();
        assert!(cli.enable_ssl());
    }

    #[test]
    fn test_negative_bounds_parse() {
        let cli =
            MigrateCli::try_parse_from(["chunk-migrate", "--start", "-10", "--end", "-2"]).unwrap();
        assert_eq!(cli.options().start, -10);
        assert_eq!(cli.options().end, Some(-2));
    }

    #[test]
    fn test_render_summary() {
        let style = Style::plain();
        let mut summary = MigrationSummary::empty(0, 100, false);
        summary.scanned = 90;
        summary.inserted = 88;
        summary.failed = 2;
        summary.last_processed_id = Some(99);

        let text = render_summary(&style, &summary);
        assert!(text.contains("[ok] Range [0, 100) migrated"));
        assert!(text.contains("inserted"));
        assert!(text.contains("2 rows failed to insert"));
        assert!(text.contains("Last processed id: 99"));
        assert!(!text.contains("would insert"));

        let dry = render_summary(&style, &MigrationSummary::empty(0, 10, true));
        assert!(dry.contains("[dry-run]"));
        assert!(dry.contains("would insert"));
        assert!(dry.contains("Last processed id: none"));
    }
}
