//! Integration tests for argument handling and exit codes of the binaries.
//!
//! None of these reach a store: every case fails (or succeeds) before a
//! connection is attempted.

mod common;

use std::fs;

use predicates::prelude::*;
use tempfile::TempDir;

use common::tool_cmd;

const TOOLS: [&str; 3] = ["chunk-generate", "chunk-inspect", "chunk-migrate"];

#[test]
fn test_help_and_version() {
    for tool in TOOLS {
        tool_cmd(tool)
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("--env-file"));

        tool_cmd(tool)
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
    }
}

#[test]
fn test_inverted_range_is_a_usage_error() {
    let temp = TempDir::new().expect("create temp dir");

    tool_cmd("chunk-migrate")
        .current_dir(temp.path())
        .args(["--start", "5", "--end", "3"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--end (3) must be >= --start (5)"));
}

#[test]
fn test_zero_batch_size_is_a_usage_error() {
    let temp = TempDir::new().expect("create temp dir");

    tool_cmd("chunk-generate")
        .current_dir(temp.path())
        .args(["--batch-size", "0"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--batch-size"));
}

#[test]
fn test_unknown_flag_is_a_usage_error() {
    tool_cmd("chunk-inspect").arg("--bogus").assert().code(2);
}

#[test]
fn test_missing_environment_is_reported() {
    let temp = TempDir::new().expect("create temp dir");

    tool_cmd("chunk-inspect")
        .current_dir(temp.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("MILVUS_HOST"))
        .stderr(predicate::str::contains("MILVUS_GRPC_PORT"));

    tool_cmd("chunk-migrate")
        .current_dir(temp.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("DB_HOST"))
        .stderr(predicate::str::contains("DB_DATABASE"));
}

#[test]
fn test_env_file_fills_some_variables() {
    let temp = TempDir::new().expect("create temp dir");
    let env_file = temp.path().join("milvus.env");
    fs::write(&env_file, "MILVUS_HOST=localhost\n").expect("write env file");

    tool_cmd("chunk-generate")
        .current_dir(temp.path())
        .arg("--env-file")
        .arg(&env_file)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("MILVUS_GRPC_PORT"))
        .stderr(predicate::str::contains("MILVUS_HOST").not());
}

#[test]
fn test_missing_env_file() {
    let temp = TempDir::new().expect("create temp dir");

    tool_cmd("chunk-inspect")
        .current_dir(temp.path())
        .args(["--env-file", "does-not-exist.env"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("cannot read env file"))
        .stderr(predicate::str::contains("Hint: Check the --env-file path"));
}
