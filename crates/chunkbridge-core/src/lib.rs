//! # chunkbridge-core
//!
//! Domain operations on chunk records: mock data generation, collection
//! inspection and range migration from a vector store to a relational store.
//!
//! Every operation is a plain function taking explicit options and `&dyn`
//! store handles and returning a report, so the CLI wires in the Milvus and
//! TiDB backends while tests use the in-memory ones.
//!
//! ## Main Types
//!
//! - [`GenerateOptions`] / [`GenerateReport`] – the mock data generator
//! - [`InspectOptions`] / [`InspectReport`] – the schema inspector
//! - [`MigrateOptions`] / [`MigrationSummary`] – the range migrator
//! - [`BridgeError`] – domain-specific error type
//!
//! ## Modules
//!
//! - [`config`] – environment and `.env` configuration
//! - [`errors`] – error types and exit codes
//! - [`mock`] – deterministic synthetic chunks
//!
//! ## Example
//!
//! ```ignore
//! use chunkbridge_core::{migrate, MigrateOptions};
//!
//! let options = MigrateOptions { start: 5, end: Some(10), ..MigrateOptions::default() };
//! let summary = migrate(&milvus, &tidb, &options, |_| {})?;
//! println!("inserted {}", summary.inserted);
//! ```

pub mod config;
pub mod errors;
pub mod generate;
pub mod inspect;
pub mod migrate;
pub mod mock;

pub use errors::{BridgeError, BridgeResult};
pub use generate::{generate, GenerateOptions, GenerateProgress, GenerateReport};
pub use inspect::{inspect, InspectOptions, InspectReport, SampleRow};
pub use migrate::{migrate, MigrateOptions, MigrationSummary, PageProgress};
