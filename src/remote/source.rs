use async_trait::async_trait;

use super::client::{ApiClient, ApiPath};
use super::types::{CountResponse, Record};
use crate::cache::ScopeKey;
use crate::error::Result;

/// Remote side of a cached collection.
///
/// Records and count are independent calls; they may disagree transiently
/// and nobody reconciles them.
#[async_trait]
pub trait RecordSource: Send + Sync {
  async fn fetch_records(&self, scope: &ScopeKey) -> Result<Vec<Record>>;

  /// Remote count, `None` when the backend omitted it.
  async fn fetch_count(&self, scope: &ScopeKey) -> Result<Option<u64>>;
}

/// Backend route family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
  /// `/api/{domain prefix}/{category}`
  Domain,
  /// `/api/{category}`, served to the reconciliation-only store
  Legacy,
}

impl Route {
  pub fn records_path(self, scope: &ScopeKey) -> ApiPath {
    let api = ApiPath::new("/api");
    match self {
      Self::Domain => api.push(scope.domain.route_prefix()).push(&scope.category),
      Self::Legacy => api.push(&scope.category),
    }
  }

  pub fn count_path(self, scope: &ScopeKey) -> ApiPath {
    self.records_path(scope).push("count")
  }
}

/// [`RecordSource`] backed by the dashboard HTTP API.
#[derive(Clone)]
pub struct HttpRecordSource {
  api: ApiClient,
  route: Route,
}

impl HttpRecordSource {
  pub fn new(api: ApiClient) -> Self {
    Self {
      api,
      route: Route::Domain,
    }
  }

  pub fn legacy(api: ApiClient) -> Self {
    Self {
      api,
      route: Route::Legacy,
    }
  }
}

#[async_trait]
impl RecordSource for HttpRecordSource {
  async fn fetch_records(&self, scope: &ScopeKey) -> Result<Vec<Record>> {
    let path = self.route.records_path(scope);
    let records: Option<Vec<Record>> = self.api.get_json(&path).await?;
    Ok(records.unwrap_or_default())
  }

  async fn fetch_count(&self, scope: &ScopeKey) -> Result<Option<u64>> {
    let response: CountResponse = self.api.get_json(&self.route.count_path(scope)).await?;
    Ok(response.count)
  }
}
