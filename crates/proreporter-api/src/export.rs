//! Report exports: a Markdown digest of the insights and the dataset as CSV.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/reports/{id}/export` | Owner only; Markdown |
//! | `GET`  | `/reports/{id}/data.csv` | Owner only; CSV in upload column order |
//! | `GET`  | `/shared/{share_id}/export` | Anyone holding the share id |

use axum::{
  extract::{Extension, Path, State},
  http::header,
  response::IntoResponse,
};
use chrono::{DateTime, Utc};
use proreporter_analyst::CompletionService;
use proreporter_core::{Caller, report::Report, store::ReportStore};
use uuid::Uuid;

use crate::{ApiState, error::ApiError, reports::owned_report};

const MARKDOWN: &str = "text/markdown; charset=utf-8";

/// Render the printable digest of a report: title, summary, trends, chart
/// count and a generation timestamp.
pub fn to_markdown(report: &Report, generated_at: DateTime<Utc>) -> String {
  let mut out = format!("# {}\n\n", inline(&report.title));
  if !report.description.is_empty() {
    out.push_str(&format!("{}\n\n", inline(&report.description)));
  }

  if let Some(insights) = &report.insights {
    if let Some(summary) = &insights.summary {
      out.push_str(&format!("## Summary\n\n{}\n\n", inline(summary)));
    }
    if let Some(trends) = insights.trends.as_ref().filter(|t| !t.is_empty()) {
      out.push_str("## Key Trends\n\n");
      for trend in trends {
        out.push_str(&format!("- {}\n", inline(trend)));
      }
      out.push('\n');
    }
    if !insights.charts.is_empty() {
      out.push_str(&format!(
        "## Visualizations\n\n{} charts are included in the analysis.\n\n",
        insights.charts.len()
      ));
    }
  }

  out.push_str(&format!("_Generated on {}_\n", generated_at.format("%Y-%m-%d %H:%M:%S UTC")));
  out
}

/// Flatten `text` onto one line and escape whatever Markdown would read as
/// structure, so titles and model output cannot add headings, lists or links.
fn inline(text: &str) -> String {
  let flat = text
    .split(['\r', '\n'])
    .map(str::trim)
    .filter(|l| !l.is_empty())
    .collect::<Vec<_>>()
    .join(" ");
  let digits = flat.bytes().take_while(u8::is_ascii_digit).count();

  let mut out = String::with_capacity(flat.len());
  for (i, c) in flat.char_indices() {
    let block_marker = (i == 0 && matches!(c, '-' | '+' | '='))
      || (digits > 0 && i == digits && matches!(c, '.' | ')'));
    if block_marker
      || matches!(c, '\\' | '`' | '*' | '_' | '[' | ']' | '<' | '>' | '#' | '|')
    {
      out.push('\\');
    }
    out.push(c);
  }
  out
}

/// `GET /reports/{id}/export`
pub async fn report_markdown<S, C>(
  State(state): State<ApiState<S, C>>,
  Extension(caller): Extension<Caller>,
  Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ReportStore + 'static,
  C: CompletionService + 'static,
{
  let report = owned_report(&state, &caller, id).await?;
  Ok(([(header::CONTENT_TYPE, MARKDOWN)], to_markdown(&report, Utc::now())))
}

/// `GET /reports/{id}/data.csv`
pub async fn report_csv<S, C>(
  State(state): State<ApiState<S, C>>,
  Extension(caller): Extension<Caller>,
  Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ReportStore + 'static,
  C: CompletionService + 'static,
{
  let report = owned_report(&state, &caller, id).await?;
  let body = proreporter_csv::serialize(&report.data).map_err(ApiError::Export)?;
  let disposition = format!("attachment; filename=\"{id}.csv\"");
  Ok((
    [
      (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
      (header::CONTENT_DISPOSITION, disposition),
    ],
    body,
  ))
}

/// `GET /shared/{share_id}/export`
pub async fn shared_markdown<S, C>(
  State(state): State<ApiState<S, C>>,
  Path(share_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ReportStore + 'static,
  C: CompletionService + 'static,
{
  let (_, report) = state
    .store
    .resolve_share(share_id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("share {share_id} not found")))?;
  Ok(([(header::CONTENT_TYPE, MARKDOWN)], to_markdown(&report, Utc::now())))
}
