//! The explicit caller context.
//!
//! Every operation that depends on "who is asking" takes a [`Caller`] rather
//! than reaching for ambient session state, so stores and sessions can be
//! exercised with any identity in tests.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An authenticated user on whose behalf an operation runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
  pub user_id:  Uuid,
  pub username: String,
}

impl Caller {
  pub fn new(user_id: Uuid, username: impl Into<String>) -> Self {
    Self { user_id, username: username.into() }
  }

  /// Whether this caller is the owner recorded as `owner_id`.
  pub fn owns(&self, owner_id: Uuid) -> bool { self.user_id == owner_id }
}
