//! # chunkbridge-cli
//!
//! Command-line front ends for `chunkbridge-core`:
//!
//! - `chunk-generate` – insert mock chunks into a Milvus collection
//! - `chunk-inspect` – show a collection's schema, row count and sample rows
//! - `chunk-migrate` – copy an id range from Milvus into a TiDB table
//!
//! Each binary is a thin `main` calling the matching module's `run()`.
//! Shared flags, logging setup and error reporting live here.

pub mod generate;
pub mod inspect;
pub mod logging;
pub mod migrate;
pub mod ui;

use std::error::Error as _;
use std::path::PathBuf;
use std::process::ExitCode;

use chunkbridge_core::config::load_dotenv;
use chunkbridge_core::{BridgeError, BridgeResult};
use clap::Args;

use crate::ui::{ColorMode, Style};

/// Version string including git commit hash
pub const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GIT_HASH"), ")");

/// Flags shared by every chunkbridge tool.
#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    /// Enable verbose output (debug logging)
    #[arg(short, long, env = "CHUNKBRIDGE_VERBOSE")]
    pub verbose: bool,

    /// Suppress progress and informational messages
    #[arg(short, long, env = "CHUNKBRIDGE_QUIET")]
    pub quiet: bool,

    /// Color output mode
    #[arg(long, value_enum, env = "CHUNKBRIDGE_COLOR", default_value_t = ColorMode::Auto)]
    pub color: ColorMode,

    /// Load connection settings from this file instead of ./.env
    #[arg(long, env = "CHUNKBRIDGE_ENV_FILE", value_name = "PATH")]
    pub env_file: Option<PathBuf>,
}

impl CommonArgs {
    /// Set up logging and build the output style.
    pub fn init(&self) -> Style {
        logging::init(self.verbose);
        Style::new(self.color)
    }

    /// Load the `.env` file into the process environment.
    pub fn load_env(&self) -> BridgeResult<()> {
        load_dotenv(self.env_file.as_deref())?;
        Ok(())
    }
}

/// Print a failed run to stderr and pick the exit code.
///
/// Domain errors carry their own exit code and hint; anything else is a
/// plain failure.
pub fn report_failure(style: &Style, err: &anyhow::Error) -> ExitCode {
    match err.downcast_ref::<BridgeError>() {
        Some(bridge) => {
            let cause = match bridge {
                BridgeError::MigrationAborted { .. } => None,
                other => other.source().map(|s| s.to_string()),
            };
            eprintln!(
                "{}",
                style.error_report(
                    &bridge.to_string(),
                    cause.as_deref(),
                    bridge.hint().as_deref()
                )
            );
            ExitCode::from(bridge.exit_code())
        }
        None => {
            let cause = err.source().map(|s| s.to_string());
            eprintln!(
                "{}",
                style.error_report(&err.to_string(), cause.as_deref(), None)
            );
            ExitCode::FAILURE
        }
    }
}
