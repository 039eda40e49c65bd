//! HTTP server for ProReporter.
//!
//! Mounts the JSON API under `/api` behind HTTP Basic auth and request
//! tracing.

pub mod auth;
pub mod error;

pub use error::Error;

use std::{path::PathBuf, sync::Arc};

use axum::{Router, middleware};
use proreporter_analyst::{CompletionService, OpenAiConfig};
use proreporter_api::ApiState;
use proreporter_core::store::ReportStore;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use auth::{UserConfig, require_auth};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `PROREPORTER_*` environment variables.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:       String,
  #[serde(default = "default_port")]
  pub port:       u16,
  pub store_path: PathBuf,
  pub completion: OpenAiConfig,
  #[serde(default)]
  pub users:      Vec<UserConfig>,
}

fn default_host() -> String { "127.0.0.1".to_string() }

fn default_port() -> u16 { 8080 }

// ─── Application state ────────────────────────────────────────────────────────

/// Everything the router needs: the API state and the accounts allowed in.
pub struct AppState<S, C> {
  pub api:   ApiState<S, C>,
  pub users: Arc<[UserConfig]>,
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the application router.
pub fn router<S, C>(state: AppState<S, C>) -> Router
where
  S: ReportStore + 'static,
  C: CompletionService + 'static,
{
  let api = proreporter_api::api_router(state.api)
    .layer(middleware::from_fn_with_state(state.users, require_auth));

  Router::new()
    .nest("/api", api)
    .layer(TraceLayer::new_for_http())
}

// ─── Integration tests ────────────────────────────────────────────────────────
