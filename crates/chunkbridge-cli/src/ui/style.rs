//! Output styling.
//!
//! Every line a tool prints goes through [`Style`] so the tags, indentation
//! and colors stay uniform:
//!
//! ```text
//! [ok] Range [0, 120) migrated
//!      Pages: 1
//! [err] Migration aborted: tidb connection failed: broken pipe
//!       Hint: Resume with --start 12
//! ```

use owo_colors::OwoColorize;

use super::color::{ColorMode, Stream};

/// Leading tag of a status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    Ok,
    Err,
    Warn,
    /// Nothing was written.
    DryRun,
}

impl Tag {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "[ok]",
            Self::Err => "[err]",
            Self::Warn => "[warn]",
            Self::DryRun => "[dry-run]",
        }
    }

    fn paint(self, enabled: bool) -> String {
        let tag = self.as_str();
        if !enabled {
            return tag.to_string();
        }
        match self {
            Self::Ok => tag.green().to_string(),
            Self::Err => tag.red().bold().to_string(),
            Self::Warn => tag.yellow().to_string(),
            Self::DryRun => tag.dimmed().to_string(),
        }
    }
}

/// Color decisions for both output streams, made once at startup.
#[derive(Debug, Clone, Copy)]
pub struct Style {
    stdout: bool,
    stderr: bool,
}

impl Style {
    pub fn new(mode: ColorMode) -> Self {
        Self {
            stdout: mode.colors(Stream::Stdout),
            stderr: mode.colors(Stream::Stderr),
        }
    }

    /// A style that never colors, for tests and piped output.
    pub fn plain() -> Self {
        Self {
            stdout: false,
            stderr: false,
        }
    }

    /// Status line for stdout.
    ///
    /// ```
    /// use chunkbridge_cli::ui::{Style, Tag};
    ///
    /// assert_eq!(Style::plain().status(Tag::Ok, "Done"), "[ok] Done");
    /// ```
    pub fn status(&self, tag: Tag, text: &str) -> String {
        format!("{} {}", tag.paint(self.stdout), text)
    }

    /// Detail under a status line, aligned past the `[ok]` tag.
    pub fn detail(&self, label: &str, value: &str) -> String {
        format!("     {}: {}", label, value)
    }

    /// `Key: value` line of a report.
    pub fn field(&self, key: &str, value: &str) -> String {
        if self.stdout {
            format!("{}: {}", key.dimmed(), value)
        } else {
            format!("{}: {}", key, value)
        }
    }

    pub fn heading(&self, title: &str) -> String {
        if self.stdout {
            title.bold().to_string()
        } else {
            title.to_string()
        }
    }

    /// Collection or table name.
    pub fn name(&self, name: &str) -> String {
        if self.stdout {
            name.cyan().to_string()
        } else {
            name.to_string()
        }
    }

    /// Text that signals a problem in an otherwise successful report.
    pub fn alert(&self, text: &str) -> String {
        if self.stdout {
            text.red().to_string()
        } else {
            text.to_string()
        }
    }

    /// Error block for stderr with optional cause and hint lines.
    pub fn error_report(&self, msg: &str, cause: Option<&str>, hint: Option<&str>) -> String {
        let mut lines = vec![format!("{} {}", Tag::Err.paint(self.stderr), msg)];
        if let Some(cause) = cause {
            lines.push(format!("      Cause: {}", cause));
        }
        if let Some(hint) = hint {
            let label = if self.stderr {
                "Hint:".cyan().to_string()
            } else {
                "Hint:".to_string()
            };
            lines.push(format!("      {} {}", label, hint));
        }
        lines.join("\n")
    }
}
