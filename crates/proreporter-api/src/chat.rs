//! Handlers for a report's insights and chat.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/reports/{id}/insights` | Runs the initial analysis on first open |
//! | `PUT`  | `/reports/{id}/insights` | Saves the in-memory insights now |
//! | `POST` | `/reports/{id}/chat` | Body: `{"query":"..."}`; 409 while a turn is running |

use axum::{
  Json,
  extract::{Extension, Path, State},
};
use proreporter_analyst::CompletionService;
use proreporter_core::{Caller, insight::InsightState, store::ReportStore};
use serde::Deserialize;
use uuid::Uuid;

use crate::{ApiState, error::ApiError};

/// `GET /reports/{id}/insights`
pub async fn open<S, C>(
  State(state): State<ApiState<S, C>>,
  Extension(caller): Extension<Caller>,
  Path(id): Path<Uuid>,
) -> Result<Json<InsightState>, ApiError>
where
  S: ReportStore + 'static,
  C: CompletionService + 'static,
{
  Ok(Json(state.sessions.open(&caller, id).await?))
}

/// `PUT /reports/{id}/insights`
pub async fn save<S, C>(
  State(state): State<ApiState<S, C>>,
  Extension(caller): Extension<Caller>,
  Path(id): Path<Uuid>,
) -> Result<Json<InsightState>, ApiError>
where
  S: ReportStore + 'static,
  C: CompletionService + 'static,
{
  Ok(Json(state.sessions.save(&caller, id).await?))
}

#[derive(Debug, Deserialize)]
pub struct ChatBody {
  pub query: String,
}

/// `POST /reports/{id}/chat`, answering with the merged insights. The store
/// write continues in the background.
pub async fn submit<S, C>(
  State(state): State<ApiState<S, C>>,
  Extension(caller): Extension<Caller>,
  Path(id): Path<Uuid>,
  Json(body): Json<ChatBody>,
) -> Result<Json<InsightState>, ApiError>
where
  S: ReportStore + 'static,
  C: CompletionService + 'static,
{
  let outcome = state.sessions.submit(&caller, id, &body.query).await?;
  Ok(Json(outcome.insights))
}
