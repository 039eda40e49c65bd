//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings, UUIDs hyphenated lowercase strings, and
//! the dataset and insight aggregates compact JSON.

use chrono::{DateTime, Utc};
use proreporter_core::{
  dataset::Dataset,
  insight::InsightState,
  report::{Report, ReportSummary, Share, User},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Aggregates ──────────────────────────────────────────────────────────────

pub fn encode_dataset(d: &Dataset) -> Result<String> { Ok(serde_json::to_string(d)?) }

pub fn decode_dataset(s: &str) -> Result<Dataset> { Ok(serde_json::from_str(s)?) }

pub fn encode_insights(i: &InsightState) -> Result<String> {
  Ok(serde_json::to_string(i)?)
}

pub fn decode_insights(s: &str) -> Result<InsightState> { Ok(serde_json::from_str(s)?) }

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawReport`]'s field order.
pub const REPORT_COLUMNS: &str =
  "r.report_id, r.user_id, r.title, r.description, r.data_json, r.insights_json, r.created_at";

/// Raw strings read directly from a `reports` row.
pub struct RawReport {
  pub report_id:     String,
  pub user_id:       String,
  pub title:         String,
  pub description:   String,
  pub data_json:     String,
  pub insights_json: Option<String>,
  pub created_at:    String,
}

impl RawReport {
  /// Read the [`REPORT_COLUMNS`] starting at column `offset`.
  pub fn from_row(row: &rusqlite::Row<'_>, offset: usize) -> rusqlite::Result<Self> {
    Ok(Self {
      report_id:     row.get(offset)?,
      user_id:       row.get(offset + 1)?,
      title:         row.get(offset + 2)?,
      description:   row.get(offset + 3)?,
      data_json:     row.get(offset + 4)?,
      insights_json: row.get(offset + 5)?,
      created_at:    row.get(offset + 6)?,
    })
  }

  pub fn into_report(self) -> Result<Report> {
    Ok(Report {
      id:          decode_uuid(&self.report_id)?,
      title:       self.title,
      description: self.description,
      data:        decode_dataset(&self.data_json)?,
      insights:    self.insights_json.as_deref().map(decode_insights).transpose()?,
      user_id:     decode_uuid(&self.user_id)?,
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read for a dashboard listing.
pub struct RawSummary {
  pub report_id:   String,
  pub title:       String,
  pub description: String,
  pub chart_count: i64,
  pub created_at:  String,
}

impl RawSummary {
  pub fn into_summary(self) -> Result<ReportSummary> {
    Ok(ReportSummary {
      id:          decode_uuid(&self.report_id)?,
      title:       self.title,
      description: self.description,
      chart_count: usize::try_from(self.chart_count).unwrap_or_default(),
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}

/// Column list matching [`RawShare`]'s field order.
pub const SHARE_COLUMNS: &str =
  "s.share_id, s.report_id, s.shared_by, s.shared_with, s.created_at";

/// Raw strings read directly from a `shared_reports` row.
pub struct RawShare {
  pub share_id:    String,
  pub report_id:   String,
  pub shared_by:   String,
  pub shared_with: String,
  pub created_at:  String,
}

impl RawShare {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      share_id:    row.get(0)?,
      report_id:   row.get(1)?,
      shared_by:   row.get(2)?,
      shared_with: row.get(3)?,
      created_at:  row.get(4)?,
    })
  }

  pub fn into_share(self) -> Result<Share> {
    Ok(Share {
      id:          decode_uuid(&self.share_id)?,
      report_id:   decode_uuid(&self.report_id)?,
      shared_by:   decode_uuid(&self.shared_by)?,
      shared_with: decode_uuid(&self.shared_with)?,
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from a `users` row.
pub struct RawUser {
  pub user_id:  String,
  pub username: String,
}

impl RawUser {
  pub fn into_user(self) -> Result<User> {
    Ok(User { id: decode_uuid(&self.user_id)?, username: self.username })
  }
}
