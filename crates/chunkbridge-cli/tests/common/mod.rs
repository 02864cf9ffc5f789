//! Shared test utilities for chunkbridge-cli integration tests.

use assert_cmd::Command;

/// Connection variables cleared before each run so the host environment
/// cannot leak into a test.
const CONNECTION_VARS: [&str; 10] = [
    "MILVUS_HOST",
    "MILVUS_GRPC_PORT",
    "MILVUS_TOKEN",
    "MILVUS_TIMEOUT_SECS",
    "DB_HOST",
    "DB_PORT",
    "DB_USERNAME",
    "DB_PASSWORD",
    "DB_DATABASE",
    "CHUNKBRIDGE_ENV_FILE",
];

/// Get a Command for one of the chunkbridge binaries with a clean environment.
///
/// # Panics
///
/// Panics if the binary cannot be found. This should not happen
/// in a properly configured test environment.
#[allow(deprecated)]
pub fn tool_cmd(name: &str) -> Command {
    let mut cmd = Command::cargo_bin(name).expect("binary should exist");
    for var in CONNECTION_VARS {
        cmd.env_remove(var);
    }
    cmd.env("NO_COLOR", "1");
    cmd
}
