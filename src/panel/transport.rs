//! HTTP transport abstraction for testability.

use async_trait::async_trait;
use reqwest::Method;
use url::Url;

use super::error::{ApiError, Result};

/// An outbound request, fully assembled by the client.
#[derive(Debug, Clone)]
pub struct ApiRequest {
  pub method: Method,
  pub url: Url,
  /// Header name/value pairs, already merged (later entries win).
  pub headers: Vec<(String, String)>,
  /// JSON-encoded body, if any.
  pub body: Option<Vec<u8>>,
}

impl ApiRequest {
  /// Look up a header value by case-insensitive name.
  pub fn header(&self, name: &str) -> Option<&str> {
    self
      .headers
      .iter()
      .rev()
      .find(|(n, _)| n.eq_ignore_ascii_case(name))
      .map(|(_, v)| v.as_str())
  }
}

/// A raw HTTP response: status plus body bytes.
#[derive(Debug, Clone)]
pub struct ApiResponse {
  pub status: u16,
  pub body: Vec<u8>,
}

impl ApiResponse {
  pub fn is_success(&self) -> bool {
    (200..300).contains(&self.status)
  }
}

/// Abstraction over the HTTP layer so client behavior (auth injection,
/// refresh-and-retry) can be tested against scripted responses.
#[async_trait]
pub trait HttpTransport: Send + Sync {
  /// Perform the request, returning a response for any HTTP status.
  /// Errors mean the request produced no HTTP response at all.
  async fn send(&self, request: ApiRequest) -> Result<ApiResponse>;
}

#[async_trait]
impl<T: HttpTransport + ?Sized> HttpTransport for std::sync::Arc<T> {
  async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
    (**self).send(request).await
  }
}

/// Default transport backed by `reqwest`.
#[derive(Clone, Default)]
pub struct ReqwestTransport {
  client: reqwest::Client,
}

impl ReqwestTransport {
  pub fn new() -> Self {
    Self::default()
  }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
  async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
    let mut builder = self.client.request(request.method, request.url);

    for (name, value) in &request.headers {
      builder = builder.header(name, value);
    }

    if let Some(body) = request.body {
      builder = builder.body(body);
    }

    let response = builder
      .send()
      .await
      .map_err(|e| ApiError::Network(e.to_string()))?;

    let status = response.status().as_u16();
    let body = response
      .bytes()
      .await
      .map_err(|e| ApiError::Network(e.to_string()))?
      .to_vec();

    Ok(ApiResponse { status, body })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_header_lookup_is_case_insensitive_and_last_wins() {
    let request = ApiRequest {
      method: Method::GET,
      url: Url::parse("http://localhost/api/system/stats").unwrap(),
      headers: vec![
        ("Content-Type".to_string(), "application/json".to_string()),
        ("authorization".to_string(), "Bearer one".to_string()),
        ("Authorization".to_string(), "Bearer two".to_string()),
      ],
      body: None,
    };

    assert_eq!(request.header("content-type"), Some("application/json"));
    assert_eq!(request.header("AUTHORIZATION"), Some("Bearer two"));
    assert_eq!(request.header("accept"), None);
  }
}
