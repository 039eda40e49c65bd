//! Handlers for sharing.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/reports/{id}/shares` | Body: `{"username":"..."}`; 404 unknown user, 409 duplicate |
//! | `GET`  | `/shared` | Shares addressed to the caller |
//! | `GET`  | `/shared/{share_id}` | Read-only report; no owner check |

use axum::{
  Json,
  extract::{Extension, Path, State},
  http::{HeaderMap, StatusCode},
  response::{IntoResponse, Response},
};
use proreporter_analyst::CompletionService;
use proreporter_core::{
  Caller,
  report::{NewShare, Report, Share},
  store::ReportStore,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{ApiState, error::ApiError, etag::compute_etag, reports::tagged_json};

#[derive(Debug, Deserialize)]
pub struct ShareBody {
  pub username: String,
}

/// `POST /reports/{id}/shares`
pub async fn create<S, C>(
  State(state): State<ApiState<S, C>>,
  Extension(caller): Extension<Caller>,
  Path(report_id): Path<Uuid>,
  Json(body): Json<ShareBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ReportStore + 'static,
  C: CompletionService + 'static,
{
  let username = body.username.trim();
  let target = state
    .store
    .find_user(username)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("user {username:?} not found")))?;

  let share = state
    .store
    .share_report(NewShare {
      report_id,
      shared_by: caller.user_id,
      shared_with: target.id,
    })
    .await
    .map_err(ApiError::store)?;

  tracing::info!(%report_id, share_id = %share.id, with = %target.username, "report shared");
  Ok((StatusCode::CREATED, Json(share)))
}

/// `GET /shared`
pub async fn inbox<S, C>(
  State(state): State<ApiState<S, C>>,
  Extension(caller): Extension<Caller>,
) -> Result<Json<Vec<Share>>, ApiError>
where
  S: ReportStore + 'static,
  C: CompletionService + 'static,
{
  let shares = state
    .store
    .list_shared_with(caller.user_id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(shares))
}

/// A report as seen through a share.
#[derive(Debug, Serialize)]
pub struct SharedReport {
  pub share:  Share,
  pub report: Report,
}

/// `GET /shared/{share_id}`
pub async fn view<S, C>(
  State(state): State<ApiState<S, C>>,
  Path(share_id): Path<Uuid>,
  headers: HeaderMap,
) -> Result<Response, ApiError>
where
  S: ReportStore + 'static,
  C: CompletionService + 'static,
{
  let (share, report) = state
    .store
    .resolve_share(share_id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("share {share_id} not found")))?;

  let etag = compute_etag(&report)?;
  Ok(tagged_json(&headers, etag, &SharedReport { share, report }))
}
