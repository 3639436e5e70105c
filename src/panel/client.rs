//! Panel API client with bearer-token auth and transparent refresh.

use reqwest::Method;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use url::Url;

use super::error::{ApiError, Result};
use super::tokens::TokenStore;
use super::transport::{ApiRequest, HttpTransport};
use super::types::{LoginResponse, RefreshResponse};

/// Retries allowed after a 401: one refresh-and-retry, never a loop.
const AUTH_RETRY_LIMIT: u32 = 1;

/// JSON-over-HTTP client for the panel API.
///
/// Injects `Authorization: Bearer <access_token>` when a token is stored and,
/// on a 401, refreshes the access token once and re-issues the request. The
/// transport and token store are injected so instances are isolated and
/// testable.
pub struct ApiClient<T: HttpTransport, S: TokenStore> {
  transport: T,
  tokens: Arc<S>,
  base_url: String,
  /// Gate coalescing concurrent token refreshes into one in-flight call.
  refresh_gate: Arc<Mutex<()>>,
}

impl<T: HttpTransport + Clone, S: TokenStore> Clone for ApiClient<T, S> {
  fn clone(&self) -> Self {
    Self {
      transport: self.transport.clone(),
      tokens: Arc::clone(&self.tokens),
      base_url: self.base_url.clone(),
      refresh_gate: Arc::clone(&self.refresh_gate),
    }
  }
}

impl<T: HttpTransport, S: TokenStore> ApiClient<T, S> {
  /// Create a client against the given API root, e.g.
  /// "https://seedbox.example.com/api".
  pub fn new(base_url: impl Into<String>, transport: T, tokens: Arc<S>) -> Self {
    Self {
      transport,
      tokens,
      base_url: base_url.into(),
      refresh_gate: Arc::new(Mutex::new(())),
    }
  }

  /// Perform a request against a relative endpoint and return the parsed
  /// JSON body.
  ///
  /// On 401 the access token is refreshed once and the request re-issued with
  /// the new token; the retry's result is returned as-is. A failed refresh
  /// yields [`ApiError::AuthenticationExpired`].
  pub async fn request(&self, method: Method, endpoint: &str, body: Option<&Value>) -> Result<Value> {
    self.request_with(method, endpoint, body, &[]).await
  }

  /// Like [`request`](Self::request) but with caller-supplied headers.
  /// Caller headers win over the defaults, including `Authorization`.
  pub async fn request_with(
    &self,
    method: Method,
    endpoint: &str,
    body: Option<&Value>,
    extra_headers: &[(&str, &str)],
  ) -> Result<Value> {
    let mut retries_left = AUTH_RETRY_LIMIT;

    loop {
      let access = self.tokens.access_token()?;
      let request =
        self.build_request(method.clone(), endpoint, body, extra_headers, access.as_deref())?;
      let response = self.transport.send(request).await?;

      if response.status == 401 && retries_left > 0 {
        retries_left -= 1;
        if self.refresh_access_token(access.as_deref()).await {
          continue;
        }
        return Err(ApiError::AuthenticationExpired);
      }

      if !response.is_success() {
        return Err(ApiError::from_response(response.status, &response.body));
      }

      if response.body.is_empty() {
        return Ok(Value::Null);
      }
      return Ok(serde_json::from_slice(&response.body)?);
    }
  }

  /// Refresh the access token using the stored refresh token.
  ///
  /// Never propagates an error: every failure mode (no refresh token,
  /// network failure, non-2xx, malformed body) normalizes to `false`.
  /// `stale_access` is the access token that triggered the refresh; if the
  /// stored token already differs once the gate is acquired, another caller
  /// refreshed first and no network call is made.
  pub(crate) async fn refresh_access_token(&self, stale_access: Option<&str>) -> bool {
    let refresh = match self.tokens.refresh_token() {
      Ok(Some(token)) => token,
      Ok(None) => {
        debug!("No refresh token present, not attempting refresh");
        return false;
      }
      Err(e) => {
        warn!("Token store read failed during refresh: {}", e);
        return false;
      }
    };

    let _gate = self.refresh_gate.lock().await;

    if let Ok(current) = self.tokens.access_token() {
      if current.as_deref() != stale_access {
        debug!("Access token already refreshed by a concurrent request");
        return true;
      }
    }

    let bearer = format!("Bearer {}", refresh);
    let result: Result<RefreshResponse> = async {
      let body = serde_json::json!({});
      let request = self.build_request(
        Method::POST,
        "/auth/refresh",
        Some(&body),
        &[("Authorization", bearer.as_str())],
        None,
      )?;

      let response = self.transport.send(request).await?;
      if !response.is_success() {
        return Err(ApiError::from_response(response.status, &response.body));
      }

      Ok(serde_json::from_slice(&response.body)?)
    }
    .await;

    match result {
      Ok(payload) => match self.tokens.set_access_token(&payload.access_token) {
        Ok(()) => true,
        Err(e) => {
          warn!("Failed to persist refreshed access token: {}", e);
          false
        }
      },
      Err(e) => {
        warn!("Token refresh failed: {}", e);
        false
      }
    }
  }

  /// Log in and persist the returned token pair.
  pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse> {
    let body = serde_json::json!({ "username": username, "password": password });
    let value = self.request(Method::POST, "/auth/login", Some(&body)).await?;
    let payload: LoginResponse = serde_json::from_value(value)?;

    self
      .tokens
      .set_tokens(&payload.access_token, &payload.refresh_token)?;

    Ok(payload)
  }

  /// Log out: best-effort server-side invalidation, then unconditionally
  /// clear the stored tokens.
  pub async fn logout(&self) -> Result<()> {
    let body = serde_json::json!({});
    if let Err(e) = self.request(Method::POST, "/auth/logout", Some(&body)).await {
      debug!("Server-side logout failed: {}", e);
    }

    self.tokens.clear()
  }

  /// Get the currently logged-in user.
  pub async fn current_user(&self) -> Result<Value> {
    self.get("/auth/me").await
  }

  pub async fn get(&self, endpoint: &str) -> Result<Value> {
    self.request(Method::GET, endpoint, None).await
  }

  pub async fn post(&self, endpoint: &str, body: Value) -> Result<Value> {
    self.request(Method::POST, endpoint, Some(&body)).await
  }

  #[allow(dead_code)]
  pub async fn put(&self, endpoint: &str, body: Value) -> Result<Value> {
    self.request(Method::PUT, endpoint, Some(&body)).await
  }

  #[allow(dead_code)]
  pub async fn delete(&self, endpoint: &str) -> Result<Value> {
    self.request(Method::DELETE, endpoint, None).await
  }

  /// Assemble the outbound request: default headers, caller overrides, then
  /// bearer injection when no `Authorization` was supplied.
  fn build_request(
    &self,
    method: Method,
    endpoint: &str,
    body: Option<&Value>,
    extra_headers: &[(&str, &str)],
    access_token: Option<&str>,
  ) -> Result<ApiRequest> {
    let url = Url::parse(&format!("{}{}", self.base_url, endpoint))
      .map_err(|e| ApiError::Network(format!("invalid endpoint URL {}: {}", endpoint, e)))?;

    let mut headers: Vec<(String, String)> =
      vec![("Content-Type".to_string(), "application/json".to_string())];

    for (name, value) in extra_headers {
      headers.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
      headers.push((name.to_string(), value.to_string()));
    }

    if let Some(token) = access_token {
      if !headers.iter().any(|(n, _)| n.eq_ignore_ascii_case("authorization")) {
        headers.push(("Authorization".to_string(), format!("Bearer {}", token)));
      }
    }

    let body = body
      .map(|v| serde_json::to_vec(v))
      .transpose()
      .map_err(ApiError::Body)?;

    Ok(ApiRequest {
      method,
      url,
      headers,
      body,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::panel::tokens::MemoryTokenStore;
  use crate::panel::transport::ApiResponse;
  use async_trait::async_trait;
  use std::collections::VecDeque;
  use std::sync::Mutex as StdMutex;

  /// Transport that pops scripted responses and records every request.
  struct MockTransport {
    responses: StdMutex<VecDeque<Result<ApiResponse>>>,
    requests: StdMutex<Vec<ApiRequest>>,
  }

  impl MockTransport {
    fn new(responses: Vec<Result<ApiResponse>>) -> Arc<Self> {
      Arc::new(Self {
        responses: StdMutex::new(responses.into()),
        requests: StdMutex::new(Vec::new()),
      })
    }

    fn requests(&self) -> Vec<ApiRequest> {
      self.requests.lock().unwrap().clone()
    }
  }

  #[async_trait]
  impl HttpTransport for MockTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
      self.requests.lock().unwrap().push(request);
      self
        .responses
        .lock()
        .unwrap()
        .pop_front()
        .expect("unexpected extra request")
    }
  }

  fn response(status: u16, body: &str) -> Result<ApiResponse> {
    Ok(ApiResponse {
      status,
      body: body.as_bytes().to_vec(),
    })
  }

  fn client(
    transport: &Arc<MockTransport>,
    store: MemoryTokenStore,
  ) -> ApiClient<Arc<MockTransport>, MemoryTokenStore> {
    ApiClient::new("http://panel.test/api", Arc::clone(transport), Arc::new(store))
  }

  #[tokio::test]
  async fn test_bearer_header_attached_exactly() {
    let transport = MockTransport::new(vec![response(200, r#"{"ok": true}"#)]);
    let api = client(&transport, MemoryTokenStore::with_tokens(Some("tok-1"), None));

    let value = api.get("/system/stats").await.unwrap();
    assert_eq!(value["ok"], true);

    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].url.as_str(), "http://panel.test/api/system/stats");
    assert_eq!(requests[0].header("authorization"), Some("Bearer tok-1"));
    assert_eq!(requests[0].header("content-type"), Some("application/json"));
  }

  #[tokio::test]
  async fn test_no_token_means_no_auth_header() {
    let transport = MockTransport::new(vec![response(200, "{}")]);
    let api = client(&transport, MemoryTokenStore::new());

    api.get("/docker/status").await.unwrap();
    assert_eq!(transport.requests()[0].header("authorization"), None);
  }

  #[tokio::test]
  async fn test_401_refreshes_once_and_retries_with_new_token() {
    let transport = MockTransport::new(vec![
      response(401, r#"{"error": "Token has expired"}"#),
      response(200, r#"{"access_token": "tok-new"}"#),
      response(200, r#"{"cpu": 12.5}"#),
    ]);
    let api = client(
      &transport,
      MemoryTokenStore::with_tokens(Some("tok-old"), Some("refresh-1")),
    );

    let value = api.get("/system/stats").await.unwrap();
    assert_eq!(value["cpu"], 12.5);

    let requests = transport.requests();
    assert_eq!(requests.len(), 3);
    // Refresh authenticates with the refresh token, not the stale access token
    assert!(requests[1].url.path().ends_with("/auth/refresh"));
    assert_eq!(requests[1].header("authorization"), Some("Bearer refresh-1"));
    // Retry carries the refreshed token
    assert_eq!(requests[2].header("authorization"), Some("Bearer tok-new"));
  }

  #[tokio::test]
  async fn test_failed_refresh_resolves_to_authentication_expired() {
    let transport = MockTransport::new(vec![
      response(401, "{}"),
      response(401, r#"{"error": "Invalid refresh token"}"#),
    ]);
    let api = client(
      &transport,
      MemoryTokenStore::with_tokens(Some("tok-old"), Some("refresh-1")),
    );

    let err = api.get("/system/stats").await.unwrap_err();
    assert!(matches!(err, ApiError::AuthenticationExpired));
    // Original request + refresh attempt, no second retry
    assert_eq!(transport.requests().len(), 2);
  }

  #[tokio::test]
  async fn test_retried_401_is_not_retried_again() {
    let transport = MockTransport::new(vec![
      response(401, "{}"),
      response(200, r#"{"access_token": "tok-new"}"#),
      response(401, r#"{"error": "Still unauthorized"}"#),
    ]);
    let api = client(
      &transport,
      MemoryTokenStore::with_tokens(Some("tok-old"), Some("refresh-1")),
    );

    let err = api.get("/system/stats").await.unwrap_err();
    match err {
      ApiError::Api { status, message } => {
        assert_eq!(status, 401);
        assert_eq!(message, "Still unauthorized");
      }
      other => panic!("expected Api error, got {:?}", other),
    }
    assert_eq!(transport.requests().len(), 3);
  }

  #[tokio::test]
  async fn test_missing_refresh_token_fails_without_network_call() {
    let transport = MockTransport::new(vec![response(401, "{}")]);
    let api = client(&transport, MemoryTokenStore::with_tokens(Some("tok-old"), None));

    let err = api.get("/system/stats").await.unwrap_err();
    assert!(matches!(err, ApiError::AuthenticationExpired));
    // Only the original request hit the wire
    assert_eq!(transport.requests().len(), 1);
  }

  #[tokio::test]
  async fn test_error_message_parsed_from_body() {
    let transport = MockTransport::new(vec![response(
      404,
      r#"{"error": "Container not found"}"#,
    )]);
    let api = client(&transport, MemoryTokenStore::with_tokens(Some("t"), None));

    let err = api.get("/docker/containers/nope").await.unwrap_err();
    assert_eq!(err.to_string(), "Container not found");
  }

  #[tokio::test]
  async fn test_error_body_parse_failure_is_swallowed() {
    let transport = MockTransport::new(vec![response(502, "<html>bad gateway</html>")]);
    let api = client(&transport, MemoryTokenStore::with_tokens(Some("t"), None));

    let err = api.get("/system/stats").await.unwrap_err();
    assert_eq!(err.to_string(), "HTTP 502");
  }

  #[tokio::test]
  async fn test_login_persists_both_tokens() {
    let transport = MockTransport::new(vec![response(
      200,
      r#"{"access_token": "a1", "refresh_token": "r1", "user": {"username": "admin"}}"#,
    )]);
    let store = Arc::new(MemoryTokenStore::new());
    let api = ApiClient::new("http://panel.test/api", Arc::clone(&transport), Arc::clone(&store));

    let payload = api.login("admin", "hunter2").await.unwrap();
    assert_eq!(payload.user["username"], "admin");
    assert_eq!(store.access_token().unwrap().as_deref(), Some("a1"));
    assert_eq!(store.refresh_token().unwrap().as_deref(), Some("r1"));
  }

  #[tokio::test]
  async fn test_logout_clears_tokens_even_when_server_fails() {
    let transport = MockTransport::new(vec![response(500, r#"{"error": "boom"}"#)]);
    let store = Arc::new(MemoryTokenStore::with_tokens(Some("a"), Some("r")));
    let api = ApiClient::new("http://panel.test/api", Arc::clone(&transport), Arc::clone(&store));

    api.logout().await.unwrap();
    assert_eq!(store.access_token().unwrap(), None);
    assert_eq!(store.refresh_token().unwrap(), None);
  }

  #[tokio::test]
  async fn test_caller_headers_win_over_defaults() {
    let transport = MockTransport::new(vec![response(200, "{}")]);
    let api = client(&transport, MemoryTokenStore::with_tokens(Some("tok"), None));

    api
      .request_with(
        Method::POST,
        "/docker/containers/abc/logs",
        None,
        &[
          ("Content-Type", "text/plain"),
          ("Authorization", "Bearer override"),
        ],
      )
      .await
      .unwrap();

    let request = &transport.requests()[0];
    assert_eq!(request.header("content-type"), Some("text/plain"));
    assert_eq!(request.header("authorization"), Some("Bearer override"));
    // No duplicate headers after the merge
    assert_eq!(request.headers.len(), 2);
  }

  #[tokio::test]
  async fn test_refresh_coalesces_when_token_already_renewed() {
    // Store already holds a newer token than the one that saw the 401:
    // refresh must succeed without any network traffic.
    let transport = MockTransport::new(vec![]);
    let api = client(
      &transport,
      MemoryTokenStore::with_tokens(Some("tok-new"), Some("refresh-1")),
    );

    assert!(api.refresh_access_token(Some("tok-old")).await);
    assert!(transport.requests().is_empty());
  }

  #[tokio::test]
  async fn test_refresh_network_failure_normalizes_to_false() {
    let transport = MockTransport::new(vec![Err(ApiError::Network("connection refused".into()))]);
    let api = client(
      &transport,
      MemoryTokenStore::with_tokens(Some("tok"), Some("refresh-1")),
    );

    assert!(!api.refresh_access_token(Some("tok")).await);
  }
}
