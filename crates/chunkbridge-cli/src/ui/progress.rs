//! Progress bars on stderr.
//!
//! Bars only draw when stderr is a terminal and neither `--quiet` nor
//! `--json-output` was given. Otherwise a hidden `indicatif` bar absorbs the
//! updates, so callers never branch on the mode.

use std::io::IsTerminal;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

/// Whether progress is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressMode {
    /// Stderr is a terminal.
    Interactive,
    /// `--quiet`, or stderr is redirected.
    Quiet,
    /// `--json-output`.
    Silent,
}

impl ProgressMode {
    pub fn detect(quiet: bool, json: bool) -> Self {
        Self::from_flags(quiet, json, std::io::stderr().is_terminal())
    }

    fn from_flags(quiet: bool, json: bool, terminal: bool) -> Self {
        match (json, quiet || !terminal) {
            (true, _) => Self::Silent,
            (false, true) => Self::Quiet,
            (false, false) => Self::Interactive,
        }
    }

    pub fn is_interactive(&self) -> bool {
        *self == Self::Interactive
    }
}

const TICKS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";
const SPINNER_TEMPLATE: &str = "{spinner:.cyan} {msg} ({elapsed})";
const BAR_TEMPLATE: &str = "[{bar:24.cyan/dim}] {pos}/{len} {msg} ({elapsed}, eta {eta})";

/// A bar or spinner, possibly hidden.
pub struct Progress {
    bar: ProgressBar,
}

impl Progress {
    /// Spinner for a call of unknown length, such as an inspection.
    pub fn spinner(message: &str, mode: ProgressMode) -> Self {
        let bar = Self::visible(mode, ProgressBar::new_spinner);
        if let Ok(style) = ProgressStyle::with_template(SPINNER_TEMPLATE) {
            bar.set_style(style.tick_chars(TICKS));
        }
        bar.set_message(message.to_string());
        if mode.is_interactive() {
            bar.enable_steady_tick(Duration::from_millis(80));
        }
        Self { bar }
    }

    /// Bar counting rows or ids up to `total`. A total of 0 can be fixed
    /// later with [`Progress::set_length`].
    pub fn bar(total: u64, message: &str, mode: ProgressMode) -> Self {
        let bar = Self::visible(mode, || ProgressBar::new(total));
        if let Ok(style) = ProgressStyle::with_template(BAR_TEMPLATE) {
            bar.set_style(style.progress_chars("█░"));
        }
        bar.set_message(message.to_string());
        Self { bar }
    }

    fn visible(mode: ProgressMode, make: impl FnOnce() -> ProgressBar) -> ProgressBar {
        if mode.is_interactive() {
            make()
        } else {
            ProgressBar::hidden()
        }
    }

    pub fn set_message(&self, message: &str) {
        self.bar.set_message(message.to_string());
    }

    pub fn set_length(&self, len: u64) {
        self.bar.set_length(len);
    }

    pub fn set_position(&self, pos: u64) {
        self.bar.set_position(pos);
    }

    /// Remove the bar before the report is printed.
    pub fn finish_clear(&self) {
        self.bar.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_from_flags() {
        assert_eq!(ProgressMode::from_flags(false, false, true), ProgressMode::Interactive);
        assert_eq!(ProgressMode::from_flags(true, false, true), ProgressMode::Quiet);
        assert_eq!(ProgressMode::from_flags(false, false, false), ProgressMode::Quiet);
        assert_eq!(ProgressMode::from_flags(true, true, true), ProgressMode::Silent);
    }

    #[test]
    fn test_hidden_bar_takes_updates() {
        let progress = Progress::bar(0, "Migrating", ProgressMode::Quiet);
        progress.set_length(20);
        progress.set_position(5);
        progress.set_message("page 2");
        progress.finish_clear();

        Progress::spinner("Inspecting", ProgressMode::Silent).finish_clear();
    }
}
