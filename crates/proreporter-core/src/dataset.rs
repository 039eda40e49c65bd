//! Dataset: the tabular data a report is built from.
//!
//! A dataset is produced once, when a CSV upload is parsed, and never changes
//! afterwards. Rows are column-name → [`Scalar`] mappings; the header order is
//! kept separately in [`Dataset::columns`] so the data can be written back out
//! in the order it was uploaded.

use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};

use crate::Result;

// ─── Scalar ──────────────────────────────────────────────────────────────────

/// A single cell value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
  Number(serde_json::Number),
  Text(String),
}

impl Scalar {
  /// Classify a raw cell.
  ///
  /// A cell becomes a number only when it is a plain decimal literal
  /// (`-?digits(.digits)?`, no leading zeros except a lone `0`, no exponent,
  /// no surrounding whitespace) that prints back as exactly the same text.
  /// Everything else, including `1.50`, `-0`, `007` and ` 42 `, is kept as
  /// text so the uploaded cell is never altered.
  pub fn infer(raw: &str) -> Self {
    if is_plain_decimal(raw)
      && let Some(n) = parse_number(raw)
      && n.to_string() == raw
    {
      return Self::Number(n);
    }
    Self::Text(raw.to_owned())
  }

  pub fn is_number(&self) -> bool { matches!(self, Self::Number(_)) }
}

impl fmt::Display for Scalar {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Number(n) => write!(f, "{n}"),
      Self::Text(s) => f.write_str(s),
    }
  }
}

impl From<&str> for Scalar {
  fn from(s: &str) -> Self { Self::Text(s.to_owned()) }
}

impl From<i64> for Scalar {
  fn from(n: i64) -> Self { Self::Number(n.into()) }
}

fn parse_number(s: &str) -> Option<serde_json::Number> {
  if s.contains('.') {
    s.parse::<f64>().ok().and_then(serde_json::Number::from_f64)
  } else {
    s.parse::<i64>().ok().map(Into::into)
  }
}

fn is_plain_decimal(s: &str) -> bool {
  let unsigned = s.strip_prefix('-').unwrap_or(s);
  let (int, frac) = match unsigned.split_once('.') {
    Some((i, f)) => (i, Some(f)),
    None => (unsigned, None),
  };

  if int.is_empty() || !int.bytes().all(|b| b.is_ascii_digit()) {
    return false;
  }
  if int.len() > 1 && int.starts_with('0') {
    return false;
  }
  match frac {
    Some(f) => !f.is_empty() && f.bytes().all(|b| b.is_ascii_digit()),
    None => true,
  }
}

// ─── Dataset ─────────────────────────────────────────────────────────────────

/// One row: column name → cell.
pub type Row = BTreeMap<String, Scalar>;

/// Parsed tabular data from an uploaded file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
  /// Column names in header order.
  pub columns: Vec<String>,
  pub rows:    Vec<Row>,
}

impl Dataset {
  pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Self {
    Self { columns, rows }
  }

  pub fn len(&self) -> usize { self.rows.len() }

  pub fn is_empty(&self) -> bool { self.rows.is_empty() }

  /// The rows as a compact JSON array of objects, the shape handed to the
  /// completion service.
  pub fn rows_json(&self) -> Result<String> {
    Ok(serde_json::to_string(&self.rows)?)
  }
}
