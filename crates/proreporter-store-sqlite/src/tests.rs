//! Integration tests for `SqliteStore` against an in-memory database.

use proreporter_core::{
  dataset::{Dataset, Row, Scalar},
  insight::{ChartBody, ChartSpec, ChatMessage, InsightState},
  report::{NewReport, NewShare},
  store::{ReportStore, StoreError, StoreErrorKind},
};
use uuid::Uuid;

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn sales() -> Dataset {
  let rows = [("Jan", 10), ("Feb", 20)]
    .into_iter()
    .map(|(m, s)| {
      let mut row = Row::new();
      row.insert("month".into(), Scalar::from(m));
      row.insert("sales".into(), Scalar::from(s));
      row
    })
    .collect();
  Dataset::new(vec!["month".into(), "sales".into()], rows)
}

fn new_report(owner: Uuid, title: &str) -> NewReport {
  NewReport::new(title, Some("monthly numbers".into()), sales(), owner).unwrap()
}

fn insights(charts: usize) -> InsightState {
  InsightState {
    summary:      Some("Sales doubled.".into()),
    trends:       Some(vec!["Upward".into()]),
    charts:       (0..charts)
      .map(|i| {
        ChartSpec::Line(ChartBody {
          title:       format!("chart {i}"),
          description: None,
          x_axis:      Some("month".into()),
          y_axis:      Some("sales".into()),
          data:        sales().rows,
        })
      })
      .collect(),
    chat_history: vec![ChatMessage::user("Analyze"), ChatMessage::assistant("Done")],
  }
}

// ─── Users ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn register_and_find_user() {
  let s = store().await;
  let id = Uuid::new_v4();
  s.register_user(id, "alice").await.unwrap();

  let found = s.find_user("alice").await.unwrap().unwrap();
  assert_eq!(found.id, id);
  assert!(s.find_user("bob").await.unwrap().is_none());
}

#[tokio::test]
async fn register_user_is_idempotent_and_renames() {
  let s = store().await;
  let id = Uuid::new_v4();
  s.register_user(id, "alice").await.unwrap();
  s.register_user(id, "alice").await.unwrap();
  s.register_user(id, "alice2").await.unwrap();

  assert!(s.find_user("alice").await.unwrap().is_none());
  assert_eq!(s.find_user("alice2").await.unwrap().unwrap().id, id);
}

// ─── Reports ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_and_get_report() {
  let s = store().await;
  let owner = Uuid::new_v4();

  let report = s.create_report(new_report(owner, "Q2 Sales")).await.unwrap();
  assert!(report.insights.is_none());

  let fetched = s.get_report(report.id).await.unwrap().unwrap();
  assert_eq!(fetched.title, "Q2 Sales");
  assert_eq!(fetched.description, "monthly numbers");
  assert_eq!(fetched.user_id, owner);
  assert_eq!(fetched.data, sales());
  assert!(fetched.insights.is_none());
}

#[tokio::test]
async fn get_missing_report_returns_none() {
  let s = store().await;
  assert!(s.get_report(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn list_reports_is_per_owner_with_chart_counts() {
  let s = store().await;
  let alice = Uuid::new_v4();
  let bob = Uuid::new_v4();

  let first = s.create_report(new_report(alice, "first")).await.unwrap();
  let second = s.create_report(new_report(alice, "second")).await.unwrap();
  s.create_report(new_report(bob, "bob's")).await.unwrap();
  s.save_insights(first.id, alice, &insights(3)).await.unwrap();

  let listed = s.list_reports(alice).await.unwrap();
  assert_eq!(listed.len(), 2);
  assert_eq!(listed[0].id, second.id, "newest first");
  assert_eq!(listed[0].chart_count, 0);
  assert_eq!(listed[1].chart_count, 3);
}

#[tokio::test]
async fn save_insights_roundtrip() {
  let s = store().await;
  let owner = Uuid::new_v4();
  let report = s.create_report(new_report(owner, "r")).await.unwrap();

  let state = insights(2);
  s.save_insights(report.id, owner, &state).await.unwrap();

  let fetched = s.get_report(report.id).await.unwrap().unwrap();
  assert_eq!(fetched.insights, Some(state));
}

#[tokio::test]
async fn save_insights_by_non_owner_is_rejected() {
  let s = store().await;
  let owner = Uuid::new_v4();
  let report = s.create_report(new_report(owner, "r")).await.unwrap();

  let err = s
    .save_insights(report.id, Uuid::new_v4(), &insights(1))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::ReportNotFound(id) if id == report.id));

  let fetched = s.get_report(report.id).await.unwrap().unwrap();
  assert!(fetched.insights.is_none(), "nothing written");
}

#[tokio::test]
async fn save_insights_for_missing_report_is_rejected() {
  let s = store().await;
  let err = s
    .save_insights(Uuid::new_v4(), Uuid::new_v4(), &insights(0))
    .await
    .unwrap_err();
  assert_eq!(err.kind(), StoreErrorKind::NotFound);
}

#[tokio::test]
async fn delete_report_requires_owner() {
  let s = store().await;
  let owner = Uuid::new_v4();
  let report = s.create_report(new_report(owner, "r")).await.unwrap();

  let err = s.delete_report(report.id, Uuid::new_v4()).await.unwrap_err();
  assert_eq!(err.kind(), StoreErrorKind::NotFound);
  assert!(s.get_report(report.id).await.unwrap().is_some());

  s.delete_report(report.id, owner).await.unwrap();
  assert!(s.get_report(report.id).await.unwrap().is_none());
}

// ─── Sharing ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn share_and_resolve() {
  let s = store().await;
  let owner = Uuid::new_v4();
  let viewer = Uuid::new_v4();
  let report = s.create_report(new_report(owner, "shared")).await.unwrap();
  s.save_insights(report.id, owner, &insights(1)).await.unwrap();

  let share = s
    .share_report(NewShare { report_id: report.id, shared_by: owner, shared_with: viewer })
    .await
    .unwrap();

  let (resolved, shared) = s.resolve_share(share.id).await.unwrap().unwrap();
  assert_eq!(resolved, share);
  assert_eq!(shared.id, report.id);
  assert_eq!(shared.user_id, owner);
  assert_eq!(shared.insights.unwrap().charts.len(), 1);

  let inbox = s.list_shared_with(viewer).await.unwrap();
  assert_eq!(inbox, vec![share]);
  assert!(s.list_shared_with(owner).await.unwrap().is_empty());
}

#[tokio::test]
async fn resolve_unknown_share_returns_none() {
  let s = store().await;
  assert!(s.resolve_share(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn sharing_twice_with_same_user_is_rejected() {
  let s = store().await;
  let owner = Uuid::new_v4();
  let viewer = Uuid::new_v4();
  let report = s.create_report(new_report(owner, "r")).await.unwrap();
  let input = NewShare { report_id: report.id, shared_by: owner, shared_with: viewer };

  s.share_report(input.clone()).await.unwrap();
  let err = s.share_report(input).await.unwrap_err();
  assert!(matches!(err, Error::AlreadyShared { .. }));
  assert_eq!(err.kind(), StoreErrorKind::Conflict);
}

#[tokio::test]
async fn only_the_owner_can_share() {
  let s = store().await;
  let owner = Uuid::new_v4();
  let stranger = Uuid::new_v4();
  let report = s.create_report(new_report(owner, "r")).await.unwrap();

  let err = s
    .share_report(NewShare {
      report_id:   report.id,
      shared_by:   stranger,
      shared_with: Uuid::new_v4(),
    })
    .await
    .unwrap_err();
  assert_eq!(err.kind(), StoreErrorKind::NotFound);
}

#[tokio::test]
async fn sharing_with_yourself_is_rejected() {
  let s = store().await;
  let owner = Uuid::new_v4();
  let report = s.create_report(new_report(owner, "r")).await.unwrap();

  let err = s
    .share_report(NewShare { report_id: report.id, shared_by: owner, shared_with: owner })
    .await
    .unwrap_err();
  assert!(matches!(err, Error::SelfShare));
  assert_eq!(err.kind(), StoreErrorKind::Invalid);
}

#[tokio::test]
async fn deleting_a_report_removes_its_shares() {
  let s = store().await;
  let owner = Uuid::new_v4();
  let viewer = Uuid::new_v4();
  let report = s.create_report(new_report(owner, "r")).await.unwrap();
  let share = s
    .share_report(NewShare { report_id: report.id, shared_by: owner, shared_with: viewer })
    .await
    .unwrap();

  s.delete_report(report.id, owner).await.unwrap();

  assert!(s.resolve_share(share.id).await.unwrap().is_none());
  assert!(s.list_shared_with(viewer).await.unwrap().is_empty());
}
