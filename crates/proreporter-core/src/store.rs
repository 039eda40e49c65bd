//! The `ReportStore` trait, the persistence sink for reports and shares.
//!
//! The trait is implemented by storage backends (e.g.
//! `proreporter-store-sqlite`). Higher layers (`proreporter-analyst`,
//! `proreporter-api`) depend on this abstraction, not on any concrete backend.
//!
//! Writes that touch an existing report take the caller's user id and must
//! fail closed: the backend only applies them when that id matches the stored
//! owner. A mismatch is reported exactly like a missing report.

use std::future::Future;

use uuid::Uuid;

use crate::{
  insight::InsightState,
  report::{NewReport, NewShare, Report, ReportSummary, Share, User},
};

/// How a backend failure should be surfaced to a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorKind {
  /// No such report, or it belongs to someone else.
  NotFound,
  /// The write collides with existing state (e.g. a duplicate share).
  Conflict,
  /// The request can never succeed (e.g. sharing with yourself).
  Invalid,
  /// Anything else: I/O, corrupt rows.
  Other,
}

/// Errors produced by a [`ReportStore`] backend.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  fn kind(&self) -> StoreErrorKind;
}

/// Abstraction over a report store backend.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait ReportStore: Send + Sync {
  type Error: StoreError;

  // ── Users ─────────────────────────────────────────────────────────────

  /// Insert or rename a directory entry. Idempotent.
  fn register_user<'a>(
    &'a self,
    id: Uuid,
    username: &'a str,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + 'a;

  /// Look a user up by name. Returns `None` if unknown.
  fn find_user<'a>(
    &'a self,
    username: &'a str,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + 'a;

  // ── Reports ───────────────────────────────────────────────────────────

  /// Persist a new report. `id` and `created_at` are set by the store and
  /// `insights` starts empty.
  fn create_report(
    &self,
    input: NewReport,
  ) -> impl Future<Output = Result<Report, Self::Error>> + Send + '_;

  /// Retrieve a report by id, regardless of owner. Returns `None` if not
  /// found.
  fn get_report(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Report>, Self::Error>> + Send + '_;

  /// List the reports owned by `owner`, newest first.
  fn list_reports(
    &self,
    owner: Uuid,
  ) -> impl Future<Output = Result<Vec<ReportSummary>, Self::Error>> + Send + '_;

  /// Replace the stored insights of a report owned by `owner`.
  fn save_insights<'a>(
    &'a self,
    id: Uuid,
    owner: Uuid,
    insights: &'a InsightState,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Delete a report owned by `owner`, together with its shares.
  fn delete_report(
    &self,
    id: Uuid,
    owner: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Sharing ───────────────────────────────────────────────────────────

  /// Share a report. `input.shared_by` must own the report; sharing the same
  /// report with the same user twice is an error.
  fn share_report(
    &self,
    input: NewShare,
  ) -> impl Future<Output = Result<Share, Self::Error>> + Send + '_;

  /// Resolve a share id to the share and its report. No owner check: shared
  /// viewers are not owners.
  fn resolve_share(
    &self,
    share_id: Uuid,
  ) -> impl Future<Output = Result<Option<(Share, Report)>, Self::Error>> + Send + '_;

  /// Shares addressed to `user`, newest first.
  fn list_shared_with(
    &self,
    user: Uuid,
  ) -> impl Future<Output = Result<Vec<Share>, Self::Error>> + Send + '_;
}
