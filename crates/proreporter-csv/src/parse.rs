//! Delimited-text parser.
//!
//! Pipeline:
//!   raw &str
//!     └─ detect_delimiter() → u8
//!          └─ csv::Reader          (quoting, line endings, blank lines, field counts)
//!               └─ header + rows → Dataset   (column checks, scalar inference)

use std::collections::HashSet;

use csv::{ReaderBuilder, StringRecord};
use proreporter_core::dataset::{Dataset, Row, Scalar};

use crate::error::{Error, Result};

const CANDIDATES: [u8; 4] = [b',', b';', b'\t', b'|'];

// ─── Delimiter ───────────────────────────────────────────────────────────────

/// Pick the candidate delimiter that occurs most often, outside quotes, on
/// the first line. Ties go to the earlier candidate; no hits means `,`.
pub fn detect_delimiter(input: &str) -> u8 {
  let mut counts = [0usize; CANDIDATES.len()];
  let mut in_quotes = false;

  for b in input.bytes() {
    match b {
      b'"' => in_quotes = !in_quotes,
      b'\n' | b'\r' if !in_quotes => break,
      _ if !in_quotes => {
        if let Some(i) = CANDIDATES.iter().position(|d| *d == b) {
          counts[i] += 1;
        }
      }
      _ => {}
    }
  }

  let mut best = 0;
  for i in 1..CANDIDATES.len() {
    if counts[i] > counts[best] {
      best = i;
    }
  }
  CANDIDATES[best]
}

// ─── Dataset assembly ────────────────────────────────────────────────────────

/// Read `input` with `delimiter`. The first non-blank record is the header;
/// every later record must have exactly as many fields.
pub(crate) fn parse_dataset(input: &str, delimiter: u8) -> Result<Dataset> {
  let mut reader = ReaderBuilder::new()
    .has_headers(true)
    .flexible(false)
    .delimiter(delimiter)
    .from_reader(input.as_bytes());

  let header = reader.headers()?.clone();
  if header.is_empty() {
    return Err(Error::Empty);
  }
  let columns = header_columns(&header)?;

  let mut rows = Vec::new();
  for record in reader.records() {
    let record = record?;
    let row: Row = columns
      .iter()
      .cloned()
      .zip(record.iter().map(Scalar::infer))
      .collect();
    rows.push(row);
  }

  if rows.is_empty() {
    return Err(Error::NoRows);
  }

  Ok(Dataset::new(columns, rows))
}

fn header_columns(header: &StringRecord) -> Result<Vec<String>> {
  let mut seen = HashSet::new();
  let mut columns = Vec::with_capacity(header.len());

  for (index, raw) in header.iter().enumerate() {
    let name = raw.trim().to_owned();
    if name.is_empty() {
      return Err(Error::EmptyColumnName { index });
    }
    if !seen.insert(name.clone()) {
      return Err(Error::DuplicateColumn(name));
    }
    columns.push(name);
  }

  Ok(columns)
}

// ─── Tests ───────────────────────────────────────────────────────────────────
