//! Handlers for `/reports` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/reports` | The caller's reports, newest first |
//! | `POST`   | `/reports?title=&description=` | Body: CSV bytes; returns 201 + report |
//! | `GET`    | `/reports/{id}` | Owner only; `ETag`, honours `If-None-Match` |
//! | `DELETE` | `/reports/{id}` | Owner only; 204 |

use axum::{
  Json,
  extract::{Extension, Path, Query, State},
  http::{HeaderMap, StatusCode, header},
  response::{IntoResponse, Response},
};
use bytes::Bytes;
use proreporter_analyst::CompletionService;
use proreporter_core::{
  Caller,
  report::{NewReport, Report, ReportSummary},
  store::ReportStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
  ApiState,
  error::ApiError,
  etag::{compute_etag, not_modified},
};

/// Load `caller`'s report, with the live session insights in place of the
/// stored ones when the report is open.
pub(crate) async fn owned_report<S, C>(
  state: &ApiState<S, C>,
  caller: &Caller,
  id: Uuid,
) -> Result<Report, ApiError>
where
  S: ReportStore + 'static,
  C: CompletionService + 'static,
{
  // Read the live state first: once it is dropped from memory, the store
  // already holds it.
  let live = state.sessions.current(id);
  let mut report = state
    .store
    .get_report(id)
    .await
    .map_err(ApiError::store)?
    .filter(|r| caller.owns(r.user_id))
    .ok_or_else(|| ApiError::NotFound(format!("report {id} not found")))?;

  if live.is_some() {
    report.insights = live;
  }
  Ok(report)
}

/// A JSON body tagged with its ETag, or `304` if the client already has it.
pub(crate) fn tagged_json<T: serde::Serialize>(
  headers: &HeaderMap,
  etag: String,
  body: &T,
) -> Response {
  if not_modified(headers, &etag) {
    return (StatusCode::NOT_MODIFIED, [(header::ETAG, etag)]).into_response();
  }
  ([(header::ETAG, etag)], Json(body)).into_response()
}

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /reports`
pub async fn list<S, C>(
  State(state): State<ApiState<S, C>>,
  Extension(caller): Extension<Caller>,
) -> Result<Json<Vec<ReportSummary>>, ApiError>
where
  S: ReportStore + 'static,
  C: CompletionService + 'static,
{
  let reports = state
    .store
    .list_reports(caller.user_id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(reports))
}

// ─── Upload ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct UploadParams {
  pub title:       Option<String>,
  pub description: Option<String>,
}

/// `POST /reports?title=...[&description=...]` with the CSV file as the body.
pub async fn create<S, C>(
  State(state): State<ApiState<S, C>>,
  Extension(caller): Extension<Caller>,
  Query(params): Query<UploadParams>,
  body: Bytes,
) -> Result<impl IntoResponse, ApiError>
where
  S: ReportStore + 'static,
  C: CompletionService + 'static,
{
  let data = proreporter_csv::parse_bytes(&body)?;
  let input = NewReport::new(
    params.title.unwrap_or_default(),
    params.description,
    data,
    caller.user_id,
  )?;

  let report = state
    .store
    .create_report(input)
    .await
    .map_err(ApiError::store)?;

  tracing::info!(
    report_id = %report.id,
    user = %caller.username,
    rows = report.data.len(),
    "report uploaded"
  );
  Ok((StatusCode::CREATED, Json(report)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /reports/{id}`
pub async fn get_one<S, C>(
  State(state): State<ApiState<S, C>>,
  Extension(caller): Extension<Caller>,
  Path(id): Path<Uuid>,
  headers: HeaderMap,
) -> Result<Response, ApiError>
where
  S: ReportStore + 'static,
  C: CompletionService + 'static,
{
  let report = owned_report(&state, &caller, id).await?;
  let etag = compute_etag(&report)?;
  Ok(tagged_json(&headers, etag, &report))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /reports/{id}`
pub async fn delete_one<S, C>(
  State(state): State<ApiState<S, C>>,
  Extension(caller): Extension<Caller>,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: ReportStore + 'static,
  C: CompletionService + 'static,
{
  state
    .store
    .delete_report(id, caller.user_id)
    .await
    .map_err(ApiError::store)?;
  state.sessions.forget(id);

  tracing::info!(report_id = %id, user = %caller.username, "report deleted");
  Ok(StatusCode::NO_CONTENT)
}
