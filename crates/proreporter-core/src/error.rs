//! Error types for `proreporter-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("report title must not be empty")]
  MissingTitle,

  #[error("dataset has no rows")]
  EmptyDataset,

  #[error("query must not be empty")]
  EmptyQuery,

  #[error("unknown chart type: {0:?}")]
  UnknownChartType(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
