//! `chunk-inspect`: show a collection's schema, row count and sample rows.

use std::process::ExitCode;

use anyhow::{Context, Result};
use chunkbridge_core::config::{milvus_config, process_env};
use chunkbridge_core::generate::DEFAULT_COLLECTION;
use chunkbridge_core::inspect::DEFAULT_SAMPLE;
use chunkbridge_core::{inspect, BridgeError, InspectOptions, InspectReport};
use chunkbridge_store::vector::MilvusStore;
use clap::Parser;

use crate::ui::format::format_thousands;
use crate::ui::table::render_fields_table;
use crate::ui::{Progress, ProgressMode, Style};
use crate::{report_failure, CommonArgs, VERSION};

/// Inspect a Milvus collection.
#[derive(Parser, Debug)]
#[command(name = "chunk-inspect", version = VERSION, about, long_about = None)]
pub struct InspectCli {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Collection to inspect
    #[arg(long, default_value = DEFAULT_COLLECTION)]
    pub collection: String,

    /// Skip the flush before counting rows
    #[arg(long)]
    pub no_flush: bool,

    /// Number of sample rows (0 disables sampling)
    #[arg(long, default_value_t = DEFAULT_SAMPLE)]
    pub sample: usize,

    /// Show embedding dimension and leading values in sample rows
    #[arg(long)]
    pub include_embedding: bool,

    /// Print the report as JSON
    #[arg(long)]
    pub json_output: bool,
}

impl InspectCli {
    pub fn options(&self) -> InspectOptions {
        InspectOptions {
            collection: self.collection.clone(),
            flush: !self.no_flush,
            sample: self.sample,
            include_embedding: self.include_embedding,
        }
    }
}

/// Entry point of the `chunk-inspect` binary.
pub fn run() -> ExitCode {
    let cli = InspectCli::parse();
    let style = cli.common.init();

    match execute(&cli, &style) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => report_failure(&style, &err),
    }
}

fn execute(cli: &InspectCli, style: &Style) -> Result<()> {
    let options = cli.options();
    if options.collection.trim().is_empty() {
        return Err(BridgeError::invalid_argument("--collection must not be empty").into());
    }

    cli.common.load_env()?;
    let config = milvus_config(process_env)?;
    let store = MilvusStore::connect(&config).map_err(BridgeError::from)?;

    let mode = ProgressMode::detect(cli.common.quiet, cli.json_output);
    let spinner = Progress::spinner("Inspecting collection", mode);
    let result = inspect(&store, &options);
    spinner.finish_clear();
    let report = result?;

    if cli.json_output {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
        println!("{}", json);
    } else {
        print_report(style, &report)?;
    }
    Ok(())
}

/// Text layout of an inspection report.
pub fn render_report(style: &Style, report: &InspectReport) -> Result<String> {
    let mut lines = vec![
        style.field("Collection", &style.name(&report.collection)),
        style.field("Row count", &format_thousands(report.row_count)),
        style.field(
            "Enable dynamic field",
            &report.schema.enable_dynamic_field.to_string(),
        ),
        style.field(
            "Load state",
            report.load_state.as_deref().unwrap_or("unknown"),
        ),
        String::new(),
        style.heading("Fields:"),
        render_fields_table(&report.schema),
    ];

    if let Some(rows) = &report.sample_rows {
        lines.push(String::new());
        lines.push(style.heading(&format!("Sample rows (n={}):", rows.len())));
        lines.push(serde_json::to_string_pretty(rows).context("Failed to serialize sample rows")?);
    }

    Ok(lines.join("\n"))
}

fn print_report(style: &Style, report: &InspectReport) -> Result<()> {
    println!("{}", render_report(style, report)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chunkbridge_store::vector::{CollectionSchema, MemoryVectorStore};
    use chunkbridge_store::ChunkRecord;

    #[test]
    fn test_flags() {
        let cli = InspectCli::try_parse_from([
            "chunk-inspect",
            "--no-flush",
            "--sample",
            "0",
            "--include-embedding",
        ])
        .unwrap();
        let options = cli.options();
        assert!(!options.flush);
        assert_eq!(options.sample, 0);
        assert!(options.include_embedding);
        assert!(!cli.json_output);
    }

    #[test]
    fn test_render_report() {
        let rows = (1..=3)
            .map(|id| ChunkRecord::new(id, 0, id - 1, format!("chunk {id}"), vec![0.0; 4]))
            .collect();
        let store = MemoryVectorStore::with_rows("chunk", CollectionSchema::chunk(4), rows);
        let report = inspect(
            &store,
            &InspectOptions {
                sample: 2,
                ..InspectOptions::default()
            },
        )
        .unwrap();

        let text = render_report(&Style::plain(), &report).unwrap();
        assert!(text.contains("Collection: chunk"));
        assert!(text.contains("Row count: 3"));
        assert!(text.contains("Enable dynamic field: true"));
        assert!(text.contains("dim=4"));
        assert!(text.contains("Sample rows (n=2):"));
        assert!(text.contains("\"text\": \"chunk 1\""));
    }
}
