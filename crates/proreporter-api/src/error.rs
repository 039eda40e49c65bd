//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use proreporter_analyst::SessionError;
use proreporter_core::store::{StoreError, StoreErrorKind};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),

  #[error("export failed: {0}")]
  Export(#[source] proreporter_csv::Error),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Map a backend error by its [`StoreErrorKind`].
  pub fn store<E: StoreError>(e: E) -> Self {
    match e.kind() {
      StoreErrorKind::NotFound => Self::NotFound(e.to_string()),
      StoreErrorKind::Conflict => Self::Conflict(e.to_string()),
      StoreErrorKind::Invalid => Self::BadRequest(e.to_string()),
      StoreErrorKind::Other => Self::Store(Box::new(e)),
    }
  }
}

impl From<SessionError> for ApiError {
  fn from(e: SessionError) -> Self {
    match e {
      SessionError::EmptyQuery => Self::BadRequest(e.to_string()),
      SessionError::ReportNotFound(_) => Self::NotFound(e.to_string()),
      SessionError::Busy(_) | SessionError::NoInsights(_) => Self::Conflict(e.to_string()),
      SessionError::Store(inner) => Self::Store(inner),
    }
  }
}

impl From<proreporter_core::Error> for ApiError {
  fn from(e: proreporter_core::Error) -> Self { Self::BadRequest(e.to_string()) }
}

impl From<proreporter_csv::Error> for ApiError {
  fn from(e: proreporter_csv::Error) -> Self { Self::BadRequest(e.to_string()) }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Conflict(m) => (StatusCode::CONFLICT, m.clone()),
      ApiError::Serialization(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
      ApiError::Export(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
      ApiError::Store(e) => {
        tracing::error!(error = %e, "store failure");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
      }
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
