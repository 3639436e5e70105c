//! Response payloads for the auth endpoints.

use serde::Deserialize;
use serde_json::Value;

/// Payload returned by `POST /auth/login`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
  pub access_token: String,
  pub refresh_token: String,
  /// The logged-in user record, passed through untyped.
  #[serde(default)]
  pub user: Value,
}

/// Payload returned by `POST /auth/refresh`.
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshResponse {
  pub access_token: String,
}
