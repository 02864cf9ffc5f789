//! Tracing subscriber setup shared by the binaries.

/// Crates whose log output the tools show.
const LOG_TARGETS: [&str; 3] = ["chunkbridge_core", "chunkbridge_store", "chunkbridge_cli"];

/// Filter directive for the workspace crates at `level`.
pub fn filter_directive(verbose: bool) -> String {
    // Always show warnings; debug only with --verbose
    let level = if verbose { "debug" } else { "warn" };
    LOG_TARGETS
        .iter()
        .map(|target| format!("{}={}", target, level))
        .collect::<Vec<_>>()
        .join(",")
}

/// Install the global subscriber. Logs go to stderr so stdout stays clean.
pub fn init(verbose: bool) {
    let filter = filter_directive(verbose);
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter.as_str())
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_directive() {
        assert_eq!(
            filter_directive(false),
            "chunkbridge_core=warn,chunkbridge_store=warn,chunkbridge_cli=warn"
        );
        assert!(filter_directive(true).contains("chunkbridge_store=debug"));
    }
}
