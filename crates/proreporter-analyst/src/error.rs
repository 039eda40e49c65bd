//! Error types for `proreporter-analyst`.

use thiserror::Error;
use uuid::Uuid;

/// A failed call to the completion service.
///
/// Never escapes the [`Dispatcher`](crate::Dispatcher); it is logged and
/// replaced by the fallback analysis.
#[derive(Debug, Error)]
pub enum CompletionError {
  #[error("transport error: {0}")]
  Transport(#[from] reqwest::Error),

  #[error("completion service returned {status}: {body}")]
  Status { status: u16, body: String },

  #[error("completion response has no message content")]
  MissingContent,

  #[error("completion content is not JSON: {0}")]
  Json(#[from] serde_json::Error),
}

/// A chat turn or save that could not be carried out.
#[derive(Debug, Error)]
pub enum SessionError {
  #[error("query must not be empty")]
  EmptyQuery,

  #[error("report {0} is already being analysed")]
  Busy(Uuid),

  /// The report does not exist or belongs to another user.
  #[error("report not found: {0}")]
  ReportNotFound(Uuid),

  #[error("report {0} has no insights to save")]
  NoInsights(Uuid),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl SessionError {
  pub(crate) fn store(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Store(Box::new(e))
  }
}

pub type Result<T, E = SessionError> = std::result::Result<T, E>;
