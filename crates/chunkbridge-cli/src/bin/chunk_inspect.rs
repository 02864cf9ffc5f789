use std::process::ExitCode;

fn main() -> ExitCode {
    chunkbridge_cli::inspect::run()
}
