//! CSV codec for ProReporter.
//!
//! Converts between delimited text uploads and [`proreporter_core`]
//! datasets on top of the [`csv`] crate. Pure synchronous; no HTTP or
//! database dependencies.
//!
//! # Quick start
//!
//! ```no_run
//! let ds = proreporter_csv::parse("month,sales\nJan,10\nFeb,20\n").unwrap();
//! assert_eq!(ds.columns, ["month", "sales"]);
//! assert_eq!(ds.len(), 2);
//! ```

pub mod error;
mod parse;
mod serialize;

pub use error::{Error, Result};
pub use parse::detect_delimiter;
use proreporter_core::dataset::Dataset;

/// Parse an uploaded file.
///
/// The header row names the columns; every following non-blank line becomes
/// one row. The delimiter is detected from the header line.
pub fn parse(input: &str) -> Result<Dataset> {
  let input = input.strip_prefix('\u{feff}').unwrap_or(input);
  parse::parse_dataset(input, detect_delimiter(input))
}

/// Parse raw upload bytes, rejecting anything that is not UTF-8.
pub fn parse_bytes(input: &[u8]) -> Result<Dataset> {
  let text = std::str::from_utf8(input).map_err(|_| Error::NotUtf8)?;
  parse(text)
}

/// Write a dataset back out as comma-separated text with CRLF line endings,
/// columns in header order.
pub fn serialize(dataset: &Dataset) -> Result<String> { serialize::to_csv(dataset, b',') }
