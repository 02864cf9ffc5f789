//! Terminal output for the chunkbridge tools.
//!
//! Reports go to stdout. Progress bars, logs and errors go to stderr, so
//! `--json-output` and redirected reports stay machine-readable.

pub mod color;
pub mod format;
pub mod progress;
pub mod style;
pub mod table;

pub use color::{ColorMode, Stream};
pub use progress::{Progress, ProgressMode};
pub use style::{Style, Tag};
