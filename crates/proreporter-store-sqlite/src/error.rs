//! Error type for `proreporter-store-sqlite`.

use proreporter_core::store::{StoreError, StoreErrorKind};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// The report does not exist or is not owned by the caller.
  #[error("report not found: {0}")]
  ReportNotFound(Uuid),

  #[error("report {report_id} is already shared with {shared_with}")]
  AlreadyShared { report_id: Uuid, shared_with: Uuid },

  #[error("cannot share a report with its owner")]
  SelfShare,
}

impl StoreError for Error {
  fn kind(&self) -> StoreErrorKind {
    match self {
      Self::ReportNotFound(_) => StoreErrorKind::NotFound,
      Self::AlreadyShared { .. } => StoreErrorKind::Conflict,
      Self::SelfShare => StoreErrorKind::Invalid,
      _ => StoreErrorKind::Other,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
