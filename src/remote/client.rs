use reqwest::header::{CACHE_CONTROL, PRAGMA};
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use url::Url;

use super::auth::TokenProvider;
use crate::error::{Error, Result};

/// Endpoint path below the base URL.
///
/// Segments are kept raw and encoded one by one when the URL is built, so a
/// category or id containing `/`, `?` or `#` stays inside its segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiPath(Vec<String>);

impl ApiPath {
  /// Fixed route such as `/api/errors/set-fixed`.
  pub fn new(route: &str) -> Self {
    Self(
      route
        .split('/')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect(),
    )
  }

  /// Append one caller-supplied segment verbatim.
  pub fn push(mut self, segment: impl Into<String>) -> Self {
    self.0.push(segment.into());
    self
  }

  pub fn segments(&self) -> &[String] {
    &self.0
  }
}

impl std::fmt::Display for ApiPath {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    for segment in &self.0 {
      write!(f, "/{}", segment)?;
    }
    Ok(())
  }
}

/// Authenticated HTTP client for the dashboard backend.
///
/// Every request carries a fresh bearer token and cache-bypassing headers.
#[derive(Clone)]
pub struct ApiClient {
  http: reqwest::Client,
  base_url: String,
  auth: Arc<dyn TokenProvider>,
}

impl ApiClient {
  pub fn new(base_url: impl Into<String>, auth: Arc<dyn TokenProvider>) -> Result<Self> {
    let base_url = base_url.into().trim_end_matches('/').to_string();
    // Reject malformed base URLs up front
    if Url::parse(&base_url)?.cannot_be_a_base() {
      return Err(opaque_base(&base_url));
    }

    Ok(Self {
      http: reqwest::Client::new(),
      base_url,
      auth,
    })
  }

  /// Build a URL for an endpoint, percent-encoding path segments and query
  /// values.
  pub fn url(&self, path: &ApiPath, query: &[(&str, &str)]) -> Result<Url> {
    let mut url = Url::parse(&self.base_url)?;
    url
      .path_segments_mut()
      .map_err(|_| opaque_base(&self.base_url))?
      .pop_if_empty()
      .extend(path.segments());
    if !query.is_empty() {
      url.query_pairs_mut().extend_pairs(query);
    }
    Ok(url)
  }

  async fn request(&self, method: Method, url: Url) -> Result<RequestBuilder> {
    let token = self.auth.token().await?;
    Ok(
      self
        .http
        .request(method, url)
        .bearer_auth(token)
        .header(CACHE_CONTROL, "no-cache")
        .header(PRAGMA, "no-cache"),
    )
  }

  /// Send a request and fail on any non-success status.
  pub async fn execute(
    &self,
    method: Method,
    path: &ApiPath,
    query: &[(&str, &str)],
    body: Option<&Value>,
  ) -> Result<Response> {
    let url = self.url(path, query)?;
    tracing::debug!(%method, %url, "backend request");

    let mut builder = self.request(method, url).await?;
    if let Some(body) = body {
      builder = builder.json(body);
    }

    check_status(builder.send().await?)
  }

  pub async fn get_json<T: DeserializeOwned>(&self, path: &ApiPath) -> Result<T> {
    let response = self.execute(Method::GET, path, &[], None).await?;
    Ok(response.json().await?)
  }

  pub async fn get_bytes(&self, path: &ApiPath, query: &[(&str, &str)]) -> Result<Vec<u8>> {
    let response = self.execute(Method::GET, path, query, None).await?;
    Ok(response.bytes().await?.to_vec())
  }

  pub async fn post_json(&self, path: &ApiPath, body: &Value) -> Result<Value> {
    let response = self.execute(Method::POST, path, &[], Some(body)).await?;
    Ok(response.json().await?)
  }
}

fn opaque_base(base_url: &str) -> Error {
  Error::InvalidInput(format!("base URL cannot carry a path: {}", base_url))
}

/// Map a non-success response to [`Error::Transport`].
fn check_status(response: Response) -> Result<Response> {
  let status = response.status();
  if status.is_success() {
    return Ok(response);
  }

  Err(Error::Transport {
    status: status.as_u16(),
    status_text: status.canonical_reason().unwrap_or_default().to_string(),
  })
}
