//! Error types for the proreporter-csv codec.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("the file is empty")]
  Empty,

  #[error("the file is not valid UTF-8 text")]
  NotUtf8,

  #[error("column {index} has an empty name")]
  EmptyColumnName { index: usize },

  #[error("duplicate column name: {0:?}")]
  DuplicateColumn(String),

  #[error("line {line}: expected {expected} fields, found {found}")]
  FieldCount { line: usize, expected: usize, found: usize },

  #[error("the file has a header but no data rows")]
  NoRows,

  #[error("malformed CSV: {0}")]
  Malformed(csv::Error),
}

impl From<csv::Error> for Error {
  fn from(e: csv::Error) -> Self {
    match e.kind() {
      csv::ErrorKind::UnequalLengths { pos, expected_len, len } => Error::FieldCount {
        line:     pos.as_ref().map_or(0, |p| p.line() as usize),
        expected: *expected_len as usize,
        found:    *len as usize,
      },
      csv::ErrorKind::Utf8 { .. } => Error::NotUtf8,
      _ => Error::Malformed(e),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
