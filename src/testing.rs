//! Test doubles for the remote side.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::cache::ScopeKey;
use crate::error::{Error, Result};
use crate::remote::{
  FtpBucket, MutationRequest, MutationTransport, Record, RecordSource, TokenProvider,
};

/// Scripted [`RecordSource`] that counts its calls.
#[derive(Clone)]
pub struct FakeSource {
  records: Arc<Mutex<std::result::Result<Vec<Record>, u16>>>,
  count: Arc<Mutex<std::result::Result<Option<u64>, u16>>>,
  record_calls: Arc<AtomicUsize>,
  count_calls: Arc<AtomicUsize>,
  yield_first: bool,
}

impl FakeSource {
  pub fn new(records: Vec<Record>, count: Option<u64>) -> Self {
    Self {
      records: Arc::new(Mutex::new(Ok(records))),
      count: Arc::new(Mutex::new(Ok(count))),
      record_calls: Arc::new(AtomicUsize::new(0)),
      count_calls: Arc::new(AtomicUsize::new(0)),
      yield_first: false,
    }
  }

  /// Suspend once before answering, so concurrent callers interleave.
  pub fn yielding(mut self) -> Self {
    self.yield_first = true;
    self
  }

  pub fn set_records(&self, records: Vec<Record>) {
    *self.records.lock().unwrap() = Ok(records);
  }

  pub fn set_count(&self, count: Option<u64>) {
    *self.count.lock().unwrap() = Ok(count);
  }

  pub fn fail_records(&self, status: u16) {
    *self.records.lock().unwrap() = Err(status);
  }

  pub fn fail_count(&self, status: u16) {
    *self.count.lock().unwrap() = Err(status);
  }

  pub fn record_calls(&self) -> usize {
    self.record_calls.load(Ordering::SeqCst)
  }

  pub fn count_calls(&self) -> usize {
    self.count_calls.load(Ordering::SeqCst)
  }
}

fn status_error(status: u16) -> Error {
  let status_text = reqwest::StatusCode::from_u16(status)
    .ok()
    .and_then(|s| s.canonical_reason())
    .unwrap_or_default()
    .to_string();
  Error::Transport {
    status,
    status_text,
  }
}

#[async_trait]
impl RecordSource for FakeSource {
  async fn fetch_records(&self, _scope: &ScopeKey) -> Result<Vec<Record>> {
    self.record_calls.fetch_add(1, Ordering::SeqCst);
    if self.yield_first {
      tokio::task::yield_now().await;
    }
    let scripted = self.records.lock().unwrap().clone();
    scripted.map_err(status_error)
  }

  async fn fetch_count(&self, _scope: &ScopeKey) -> Result<Option<u64>> {
    self.count_calls.fetch_add(1, Ordering::SeqCst);
    if self.yield_first {
      tokio::task::yield_now().await;
    }
    let scripted = *self.count.lock().unwrap();
    scripted.map_err(status_error)
  }
}

/// [`MutationTransport`] that records requests and answers from a script.
#[derive(Default)]
pub struct FakeTransport {
  pub performed: Mutex<Vec<MutationRequest>>,
  pub produced: Mutex<Vec<(String, Value)>>,
  pub fail_with: Option<u16>,
}

impl FakeTransport {
  pub fn failing(status: u16) -> Self {
    Self {
      fail_with: Some(status),
      ..Self::default()
    }
  }

  pub fn performed(&self) -> Vec<MutationRequest> {
    self.performed.lock().unwrap().clone()
  }
}

#[async_trait]
impl MutationTransport for FakeTransport {
  async fn perform(&self, request: &MutationRequest) -> Result<()> {
    if let Some(status) = self.fail_with {
      return Err(status_error(status));
    }
    self.performed.lock().unwrap().push(request.clone());
    Ok(())
  }

  async fn download(&self, bucket: FtpBucket, filename: &str) -> Result<Vec<u8>> {
    if let Some(status) = self.fail_with {
      return Err(status_error(status));
    }
    Ok(format!("{}/{}", bucket, filename).into_bytes())
  }

  async fn produce(&self, apipath: &str, payload: &Value) -> Result<Value> {
    if let Some(status) = self.fail_with {
      return Err(status_error(status));
    }
    self
      .produced
      .lock()
      .unwrap()
      .push((apipath.to_string(), payload.clone()));
    Ok(serde_json::json!({ "status": "success" }))
  }
}

/// A fixed bearer token.
pub struct StaticToken(pub String);

#[async_trait]
impl TokenProvider for StaticToken {
  async fn token(&self) -> Result<String> {
    Ok(self.0.clone())
  }
}
