//! `chunk-generate`: insert mock chunk records into a Milvus collection.

use std::process::ExitCode;

use anyhow::Result;
use chunkbridge_core::config::{milvus_config, process_env};
use chunkbridge_core::generate::{
    DEFAULT_BATCH_SIZE, DEFAULT_CHUNKS_PER_DOC, DEFAULT_COLLECTION, DEFAULT_DOCS,
};
use chunkbridge_core::{generate, BridgeError, GenerateOptions, GenerateReport};
use chunkbridge_store::vector::{MilvusStore, DEFAULT_EMBEDDING_DIM};
use clap::Parser;
use tracing::debug;

use crate::ui::format::{format_duration, format_thousands, plural};
use crate::ui::{Progress, ProgressMode, Style, Tag};
use crate::{report_failure, CommonArgs, VERSION};

/// Generate mock chunk records into a Milvus collection.
#[derive(Parser, Debug)]
#[command(name = "chunk-generate", version = VERSION, about, long_about = None)]
pub struct GenerateCli {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Target collection
    #[arg(long, default_value = DEFAULT_COLLECTION)]
    pub collection: String,

    /// Number of mock documents
    #[arg(long, default_value_t = DEFAULT_DOCS)]
    pub docs: u32,

    /// Chunks generated per document
    #[arg(long, default_value_t = DEFAULT_CHUNKS_PER_DOC)]
    pub chunks_per_doc: u32,

    /// Rows per insert call
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,

    /// Drop the collection before inserting
    #[arg(long)]
    pub recreate: bool,

    /// First primary key (default: one past the highest existing id)
    #[arg(long, allow_negative_numbers = true)]
    pub start_id: Option<i64>,

    /// Embedding dimension for a new collection
    #[arg(long, default_value_t = DEFAULT_EMBEDDING_DIM)]
    pub dim: usize,
}

impl GenerateCli {
    pub fn options(&self) -> GenerateOptions {
        GenerateOptions {
            collection: self.collection.clone(),
            docs: self.docs,
            chunks_per_doc: self.chunks_per_doc,
            batch_size: self.batch_size,
            recreate: self.recreate,
            start_id: self.start_id,
            dim: self.dim,
        }
    }
}

/// Entry point of the `chunk-generate` binary.
pub fn run() -> ExitCode {
    let cli = GenerateCli::parse();
    let style = cli.common.init();

    match execute(&cli, &style) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => report_failure(&style, &err),
    }
}

fn execute(cli: &GenerateCli, style: &Style) -> Result<()> {
    let options = cli.options();
    options.validate()?;

    cli.common.load_env()?;
    let config = milvus_config(process_env)?;
    debug!("Connecting to Milvus at {}", config.base_url());
    let store = MilvusStore::connect(&config).map_err(BridgeError::from)?;

    let mode = ProgressMode::detect(cli.common.quiet, false);
    let progress = Progress::bar(options.total(), "Inserting chunks", mode);
    let result = generate(&store, &options, |p| progress.set_position(p.inserted));
    progress.finish_clear();

    print_report(style, &result?);
    Ok(())
}

fn print_report(style: &Style, report: &GenerateReport) {
    let action = if report.created { "created" } else { "existing" };
    println!(
        "{}",
        style.status(
            Tag::Ok,
            &format!(
                "Inserted {} into {} collection {}",
                plural(report.inserted, "chunk"),
                action,
                style.name(&report.collection)
            ),
        )
    );
    let ids = match report.last_id {
        Some(last) => format!("{}..={}", report.first_id, last),
        None => "none".to_string(),
    };
    println!("{}", style.detail("Ids", &ids));
    println!("{}", style.detail("Embedding dim", &report.dim.to_string()));
    println!(
        "{}",
        style.detail("Batches", &format_thousands(report.batches))
    );
    println!(
        "{}",
        style.detail("Elapsed", &format_duration(report.elapsed))
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = GenerateCli::try_parse_from(["chunk-generate"]).unwrap();
        let options = cli.options();
        assert_eq!(options.collection, "chunk");
        assert_eq!(options.total(), 15);
        assert_eq!(options.batch_size, 128);
        assert_eq!(options.start_id, None);
        assert!(!options.recreate);
    }

    #[test]
    fn test_flags() {
        let cli = GenerateCli::try_parse_from([
            "chunk-generate",
            "--collection",
            "demo",
            "--docs",
            "10",
            "--chunks-per-doc",
            "2",
            "--start-id",
            "-5",
            "--recreate",
            "--dim",
            "8",
        ])
        .unwrap();
        let options = cli.options();
        assert_eq!(options.collection, "demo");
        assert_eq!(options.total(), 20);
        assert_eq!(options.start_id, Some(-5));
        assert_eq!(options.dim, 8);
        assert!(options.recreate);
    }

    #[test]
    fn test_rejects_non_numeric_docs() {
        assert!(GenerateCli::try_parse_from(["chunk-generate", "--docs", "many"]).is_err());
    }
}
