//! Color mode resolution.
//!
//! Reports go to stdout and errors to stderr, and either may be redirected on
//! its own, so `auto` is resolved per stream. `NO_COLOR` (https://no-color.org/)
//! turns colors off everywhere.

use std::io::IsTerminal;

use clap::ValueEnum;

/// Value of `--color`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ColorMode {
    Always,
    Never,
    /// Color a stream only when it is a terminal.
    #[default]
    Auto,
}

/// Output stream a piece of text is written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Stdout,
    Stderr,
}

impl Stream {
    fn is_terminal(self) -> bool {
        match self {
            Self::Stdout => std::io::stdout().is_terminal(),
            Self::Stderr => std::io::stderr().is_terminal(),
        }
    }
}

impl ColorMode {
    /// Whether text written to `stream` gets colors.
    pub fn colors(self, stream: Stream) -> bool {
        self.resolve(std::env::var_os("NO_COLOR").is_some(), stream.is_terminal())
    }

    fn resolve(self, no_color: bool, terminal: bool) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::Auto => !no_color && terminal,
        }
    }
}
