//! HTTP Basic auth against the configured users, producing the [`Caller`]
//! every API handler acts for.

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use axum::{
  extract::{Request, State},
  http::HeaderMap,
  middleware::Next,
  response::Response,
};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use proreporter_core::Caller;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::Error;

/// One `[[users]]` entry of the configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct UserConfig {
  /// Stable id; reports and shares are keyed by it, so keep it across renames.
  pub id:            Uuid,
  pub username:      String,
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  pub password_hash: String,
}

/// Verify Basic credentials against `users`, returning who is calling.
pub fn verify_auth(headers: &HeaderMap, users: &[UserConfig]) -> Result<Caller, Error> {
  let header_val = headers
    .get(axum::http::header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .ok_or(Error::Unauthorized)?;

  let encoded = header_val
    .strip_prefix("Basic ")
    .ok_or(Error::Unauthorized)?;

  let decoded = B64.decode(encoded).map_err(|_| Error::Unauthorized)?;
  let creds   = std::str::from_utf8(&decoded).map_err(|_| Error::Unauthorized)?;

  let (username, password) = creds.split_once(':').ok_or(Error::Unauthorized)?;

  let user = users
    .iter()
    .find(|u| u.username == username)
    .ok_or(Error::Unauthorized)?;

  let parsed_hash = PasswordHash::new(&user.password_hash)
    .map_err(|_| Error::Unauthorized)?;

  Argon2::default()
    .verify_password(password.as_bytes(), &parsed_hash)
    .map_err(|_| Error::Unauthorized)?;

  Ok(Caller::new(user.id, &user.username))
}

/// Middleware: reject unauthenticated requests, otherwise insert the
/// [`Caller`] as a request extension.
pub async fn require_auth(
  State(users): State<Arc<[UserConfig]>>,
  mut req: Request,
  next: Next,
) -> Result<Response, Error> {
  let caller = verify_auth(req.headers(), &users).inspect_err(|_| {
    tracing::debug!(path = %req.uri().path(), "rejected unauthenticated request");
  })?;
  req.extensions_mut().insert(caller);
  Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
  use super::*;
  use axum::http::{HeaderValue, header};

  fn hash(password: &str) -> String {
    use argon2::{PasswordHasher, password_hash::SaltString};
    use rand_core::OsRng;
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .unwrap()
      .to_string()
  }

  fn users() -> Vec<UserConfig> {
    vec![
      UserConfig { id: Uuid::from_u128(1), username: "alice".into(), password_hash: hash("secret") },
      UserConfig { id: Uuid::from_u128(2), username: "bob".into(), password_hash: hash("hunter2") },
    ]
  }

  fn basic(user: &str, pass: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    let value = format!("Basic {}", B64.encode(format!("{user}:{pass}")));
    headers.insert(header::AUTHORIZATION, HeaderValue::from_str(&value).unwrap());
    headers
  }

  #[test]
  fn correct_credentials_identify_the_user() {
    let caller = verify_auth(&basic("bob", "hunter2"), &users()).unwrap();
    assert_eq!(caller, Caller::new(Uuid::from_u128(2), "bob"));
  }

  #[test]
  fn wrong_password() {
    let r = verify_auth(&basic("alice", "hunter2"), &users());
    assert!(matches!(r, Err(Error::Unauthorized)));
  }

  #[test]
  fn unknown_user() {
    let r = verify_auth(&basic("carol", "secret"), &users());
    assert!(matches!(r, Err(Error::Unauthorized)));
  }

  #[test]
  fn missing_header() {
    assert!(matches!(verify_auth(&HeaderMap::new(), &users()), Err(Error::Unauthorized)));
  }

  #[test]
  fn invalid_base64() {
    let mut headers = HeaderMap::new();
    headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic !!!not-base64!!!"));
    assert!(matches!(verify_auth(&headers, &users()), Err(Error::Unauthorized)));
  }

  #[test]
  fn password_may_contain_colons() {
    let users = vec![UserConfig {
      id:            Uuid::from_u128(3),
      username:      "carol".into(),
      password_hash: hash("a:b:c"),
    }];
    assert!(verify_auth(&basic("carol", "a:b:c"), &users).is_ok());
  }
}
