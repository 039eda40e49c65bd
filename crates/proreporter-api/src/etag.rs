//! ETags for report representations.
//!
//! A report's dataset and title never change after upload, so the tag is a
//! SHA-256 over the report id and its serialised insights.

use axum::http::{HeaderMap, header};
use proreporter_core::report::Report;
use sha2::{Digest, Sha256};

/// Compute the quoted strong ETag for `report`.
pub fn compute_etag(report: &Report) -> Result<String, serde_json::Error> {
  let mut hasher = Sha256::new();
  hasher.update(report.id.as_bytes());
  if let Some(insights) = &report.insights {
    hasher.update(serde_json::to_vec(insights)?);
  }
  Ok(format!("\"{}\"", hex::encode(hasher.finalize())))
}

/// Whether the request's `If-None-Match` names `etag` (or is `*`).
///
/// Tags are compared without their quotes or a weak `W/` prefix, since some
/// clients send them bare.
pub fn not_modified(headers: &HeaderMap, etag: &str) -> bool {
  let Some(value) = headers.get(header::IF_NONE_MATCH).and_then(|v| v.to_str().ok()) else {
    return false;
  };
  let wanted = etag.trim_matches('"');
  value.split(',').map(str::trim).any(|candidate| {
    candidate == "*" || candidate.trim_start_matches("W/").trim_matches('"') == wanted
  })
}

#[cfg(test)]
mod tests {
  use axum::http::HeaderValue;
  use chrono::Utc;
  use proreporter_core::{dataset::Dataset, insight::InsightState};
  use uuid::Uuid;

  use super::*;

  fn report(insights: Option<InsightState>) -> Report {
    Report {
      id: Uuid::nil(),
      title: "t".into(),
      description: String::new(),
      data: Dataset::default(),
      insights,
      user_id: Uuid::nil(),
      created_at: Utc::now(),
    }
  }

  fn if_none_match(value: &'static str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::IF_NONE_MATCH, HeaderValue::from_static(value));
    headers
  }

  #[test]
  fn etag_changes_with_insights() {
    let before = compute_etag(&report(None)).unwrap();
    let after = compute_etag(&report(Some(InsightState {
      summary: Some("s".into()),
      ..Default::default()
    })))
    .unwrap();
    assert_ne!(before, after);
    assert!(before.starts_with('"') && before.ends_with('"'));
  }

  #[test]
  fn etag_ignores_creation_time() {
    let a = report(None);
    let mut b = report(None);
    b.created_at = a.created_at + chrono::Duration::seconds(5);
    assert_eq!(compute_etag(&a).unwrap(), compute_etag(&b).unwrap());
  }

  #[test]
  fn if_none_match_accepts_quoted_bare_weak_and_star() {
    let etag = "\"abc\"";
    assert!(not_modified(&if_none_match("\"abc\""), etag));
    assert!(not_modified(&if_none_match("abc"), etag));
    assert!(not_modified(&if_none_match("W/\"abc\""), etag));
    assert!(not_modified(&if_none_match("\"x\", \"abc\""), etag));
    assert!(not_modified(&if_none_match("*"), etag));
    assert!(!not_modified(&if_none_match("\"stale\""), etag));
    assert!(!not_modified(&HeaderMap::new(), etag));
  }
}
