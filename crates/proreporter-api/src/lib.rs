//! JSON REST API for ProReporter.
//!
//! Exposes an axum [`Router`] backed by any [`ReportStore`] and
//! [`CompletionService`]. Every handler acts on behalf of the [`Caller`]
//! found in the request extensions; authenticating the request and inserting
//! that extension is the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", proreporter_api::api_router(state.clone()))
//! ```
//!
//! [`Caller`]: proreporter_core::Caller

pub mod chat;
pub mod error;
pub mod etag;
pub mod export;
pub mod reports;
pub mod shares;

use std::sync::Arc;

use axum::{Router, routing::get};
use proreporter_analyst::{AnalysisSession, CompletionService};
use proreporter_core::store::ReportStore;

pub use error::ApiError;

/// Shared state threaded through all API handlers.
pub struct ApiState<S, C> {
  pub store:    Arc<S>,
  pub sessions: AnalysisSession<S, C>,
}

impl<S, C> Clone for ApiState<S, C> {
  fn clone(&self) -> Self {
    Self { store: Arc::clone(&self.store), sessions: self.sessions.clone() }
  }
}

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S, C>(state: ApiState<S, C>) -> Router<()>
where
  S: ReportStore + 'static,
  C: CompletionService + 'static,
{
  Router::new()
    // Reports
    .route("/reports", get(reports::list::<S, C>).post(reports::create::<S, C>))
    .route("/reports/{id}", get(reports::get_one::<S, C>).delete(reports::delete_one::<S, C>))
    // Insights & chat
    .route("/reports/{id}/insights", get(chat::open::<S, C>).put(chat::save::<S, C>))
    .route("/reports/{id}/chat", axum::routing::post(chat::submit::<S, C>))
    // Exports
    .route("/reports/{id}/export", get(export::report_markdown::<S, C>))
    .route("/reports/{id}/data.csv", get(export::report_csv::<S, C>))
    // Sharing
    .route("/reports/{id}/shares", axum::routing::post(shares::create::<S, C>))
    .route("/shared", get(shares::inbox::<S, C>))
    .route("/shared/{share_id}", get(shares::view::<S, C>))
    .route("/shared/{share_id}/export", get(export::shared_markdown::<S, C>))
    .with_state(state)
}

// ─── Integration tests ────────────────────────────────────────────────────────
