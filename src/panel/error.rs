//! Error types for the panel API client.

use thiserror::Error;

/// Errors surfaced by [`ApiClient`](super::client::ApiClient) operations.
#[derive(Error, Debug)]
pub enum ApiError {
  /// The session expired and the token refresh also failed.
  /// The caller is expected to start a new login flow.
  #[error("authentication expired, login required")]
  AuthenticationExpired,

  /// Non-success HTTP response from the panel backend.
  /// Carries the server-supplied `error` message when the body had one.
  #[error("{message}")]
  Api {
    /// HTTP status code.
    status: u16,
    /// Server message, or "HTTP <status>" when the body had none.
    message: String,
  },

  /// The request never produced an HTTP response.
  #[error("network error: {0}")]
  Network(String),

  /// A success response carried a body that failed to parse as JSON.
  #[error("invalid response body: {0}")]
  Body(#[from] serde_json::Error),

  /// Token persistence failed.
  #[error("token store error: {0}")]
  TokenStore(String),
}

impl ApiError {
  /// Build an [`ApiError::Api`] from a status code and raw response body,
  /// preferring the backend's `{"error": "..."}` message.
  ///
  /// A body that fails to parse is treated as an empty error payload.
  pub fn from_response(status: u16, body: &[u8]) -> Self {
    let message = serde_json::from_slice::<serde_json::Value>(body)
      .ok()
      .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(String::from))
      .unwrap_or_else(|| format!("HTTP {}", status));

    ApiError::Api { status, message }
  }
}

/// A specialized `Result` type for panel API operations.
pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_server_message_preferred() {
    let err = ApiError::from_response(400, br#"{"error": "Missing username or password"}"#);
    assert_eq!(err.to_string(), "Missing username or password");
  }

  #[test]
  fn test_malformed_body_falls_back_to_status() {
    let err = ApiError::from_response(502, b"<html>bad gateway</html>");
    assert_eq!(err.to_string(), "HTTP 502");
  }

  #[test]
  fn test_json_body_without_error_field() {
    let err = ApiError::from_response(500, br#"{"detail": "boom"}"#);
    assert_eq!(err.to_string(), "HTTP 500");
  }
}
