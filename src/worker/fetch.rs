//! Request/response types for the shell cache, plus the network seam.

use async_trait::async_trait;
use reqwest::Method;
use url::Url;

/// An intercepted request, reduced to what the serving strategies need.
#[derive(Debug, Clone)]
pub struct FetchRequest {
  pub method: Method,
  pub url: Url,
  /// Declared `Accept` header, if any. Drives strategy selection.
  pub accept: Option<String>,
}

impl FetchRequest {
  pub fn get(url: Url) -> Self {
    Self {
      method: Method::GET,
      url,
      accept: None,
    }
  }

  pub fn with_accept(mut self, accept: &str) -> Self {
    self.accept = Some(accept.to_string());
    self
  }

  /// Whether the request negotiates for an HTML document.
  pub fn accepts_html(&self) -> bool {
    self
      .accept
      .as_deref()
      .is_some_and(|a| a.contains("text/html"))
  }
}

/// A response snapshot: status, content type and body bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
  pub status: u16,
  pub content_type: Option<String>,
  pub body: Vec<u8>,
}

impl FetchResponse {
  pub fn is_success(&self) -> bool {
    self.status == 200
  }

  /// Synthesized response served when neither network nor cache can help.
  pub fn offline_unavailable() -> Self {
    Self {
      status: 503,
      content_type: Some("text/plain".to_string()),
      body: b"Offline - Resource not available".to_vec(),
    }
  }
}

/// Network seam for the worker, so strategies can be driven against scripted
/// outcomes in tests.
#[async_trait]
pub trait Fetch: Send + Sync {
  /// Fetch over the network. `Err` means the transport failed entirely
  /// (offline, DNS, refused); HTTP error statuses come back as `Ok`.
  async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, FetchError>;
}

#[async_trait]
impl<T: Fetch + ?Sized> Fetch for std::sync::Arc<T> {
  async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, FetchError> {
    (**self).fetch(request).await
  }
}

/// Opaque network failure. The worker only ever logs it.
#[derive(Debug, Clone)]
pub struct FetchError(pub String);

impl std::fmt::Display for FetchError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

impl std::error::Error for FetchError {}

/// Default network fetcher backed by `reqwest`.
#[derive(Clone, Default)]
pub struct HttpFetcher {
  client: reqwest::Client,
}

impl HttpFetcher {
  pub fn new() -> Self {
    Self::default()
  }
}

#[async_trait]
impl Fetch for HttpFetcher {
  async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, FetchError> {
    let mut builder = self.client.request(request.method.clone(), request.url.clone());

    if let Some(accept) = &request.accept {
      builder = builder.header("Accept", accept);
    }

    let response = builder.send().await.map_err(|e| FetchError(e.to_string()))?;

    let status = response.status().as_u16();
    let content_type = response
      .headers()
      .get("content-type")
      .and_then(|v| v.to_str().ok())
      .map(String::from);
    let body = response
      .bytes()
      .await
      .map_err(|e| FetchError(e.to_string()))?
      .to_vec();

    Ok(FetchResponse {
      status,
      content_type,
      body,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_accepts_html() {
    let url = Url::parse("http://panel.test/").unwrap();

    let html = FetchRequest::get(url.clone())
      .with_accept("text/html,application/xhtml+xml,*/*;q=0.8");
    assert!(html.accepts_html());

    let json = FetchRequest::get(url.clone()).with_accept("application/json");
    assert!(!json.accepts_html());

    let none = FetchRequest::get(url);
    assert!(!none.accepts_html());
  }

  #[test]
  fn test_offline_response_shape() {
    let response = FetchResponse::offline_unavailable();
    assert_eq!(response.status, 503);
    assert_eq!(response.content_type.as_deref(), Some("text/plain"));
  }
}
