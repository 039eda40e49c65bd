//! Reports, shares and users.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, dataset::Dataset, insight::InsightState};

// ─── Report ──────────────────────────────────────────────────────────────────

/// An uploaded dataset together with its accumulated insights.
///
/// Only `insights` changes after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
  pub id:          Uuid,
  pub title:       String,
  pub description: String,
  pub data:        Dataset,
  pub insights:    Option<InsightState>,
  pub user_id:     Uuid,
  pub created_at:  DateTime<Utc>,
}

/// Input to [`crate::store::ReportStore::create_report`].
/// `id` and `created_at` are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewReport {
  pub title:       String,
  pub description: String,
  pub data:        Dataset,
  pub user_id:     Uuid,
}

impl NewReport {
  /// Validate the upload form: a non-blank title and at least one row.
  pub fn new(
    title: impl Into<String>,
    description: Option<String>,
    data: Dataset,
    user_id: Uuid,
  ) -> Result<Self> {
    let title = title.into().trim().to_owned();
    if title.is_empty() {
      return Err(Error::MissingTitle);
    }
    if data.is_empty() {
      return Err(Error::EmptyDataset);
    }
    Ok(Self {
      title,
      description: description.unwrap_or_default().trim().to_owned(),
      data,
      user_id,
    })
  }
}

/// Dashboard listing entry; omits the dataset and transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
  pub id:          Uuid,
  pub title:       String,
  pub description: String,
  pub chart_count: usize,
  pub created_at:  DateTime<Utc>,
}

// ─── Sharing ─────────────────────────────────────────────────────────────────

/// Grants `shared_with` read-only access to a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Share {
  pub id:          Uuid,
  pub report_id:   Uuid,
  pub shared_by:   Uuid,
  pub shared_with: Uuid,
  pub created_at:  DateTime<Utc>,
}

/// Input to [`crate::store::ReportStore::share_report`].
#[derive(Debug, Clone)]
pub struct NewShare {
  pub report_id:   Uuid,
  pub shared_by:   Uuid,
  pub shared_with: Uuid,
}

// ─── Users ───────────────────────────────────────────────────────────────────

/// An entry of the user directory, used to resolve share targets by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  pub id:       Uuid,
  pub username: String,
}
