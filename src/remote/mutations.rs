//! Write endpoints of the backend.

use async_trait::async_trait;
use reqwest::Method;
use serde_json::{json, Value};

use super::client::{ApiClient, ApiPath};
use super::types::FtpBucket;
use crate::cache::Domain;
use crate::error::Result;

/// A state-changing backend action. The category it applies to is supplied
/// when the request is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
  SetFixed { id: String },
  SetUnderAnalysis { id: String },
  SetAllFixed,
  SetAllUnderAnalysis,
  ResetById { id: String },
  ResetAll,
  DeleteById { id: String },
  DeleteAll,
  RenameFile {
    old_filename: String,
    new_filename: String,
  },
  DeleteFile { filename: String },
}

/// Concrete HTTP request for a mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct MutationRequest {
  pub method: Method,
  pub path: ApiPath,
  pub query: Vec<(&'static str, String)>,
  pub body: Option<Value>,
}

impl MutationRequest {
  fn new(method: Method, path: ApiPath) -> Self {
    Self {
      method,
      path,
      query: Vec::new(),
      body: None,
    }
  }

  fn body(mut self, body: Value) -> Self {
    self.body = Some(body);
    self
  }

  fn query(mut self, name: &'static str, value: &str) -> Self {
    self.query.push((name, value.to_string()));
    self
  }
}

impl Mutation {
  /// Domain whose cache the mutation invalidates.
  pub fn domain(&self) -> Domain {
    match self {
      Self::SetFixed { .. }
      | Self::SetUnderAnalysis { .. }
      | Self::SetAllFixed
      | Self::SetAllUnderAnalysis => Domain::Error,
      Self::ResetById { .. } | Self::ResetAll | Self::DeleteById { .. } | Self::DeleteAll => {
        Domain::Reconciliation
      }
      Self::RenameFile { .. } | Self::DeleteFile { .. } => Domain::Ftp,
    }
  }

  pub fn action(&self) -> &'static str {
    match self {
      Self::SetFixed { .. } => "set-fixed",
      Self::SetUnderAnalysis { .. } => "set-under-analysis",
      Self::SetAllFixed => "set-all-fixed",
      Self::SetAllUnderAnalysis => "set-all-under-analysis",
      Self::ResetById { .. } => "reset",
      Self::ResetAll => "reset-all",
      Self::DeleteById { .. } => "delete",
      Self::DeleteAll => "delete-all",
      Self::RenameFile { .. } => "rename-file",
      Self::DeleteFile { .. } => "delete-file",
    }
  }

  /// Build the request for `category`.
  ///
  /// Error actions are not category-scoped on the backend. FTP actions
  /// require `category` to name a bucket.
  pub fn request(&self, category: &str) -> Result<MutationRequest> {
    let request = match self {
      Self::SetFixed { id } => {
        MutationRequest::new(Method::POST, errors("set-fixed")).body(json!({ "object_id": id }))
      }
      Self::SetUnderAnalysis { id } => {
        MutationRequest::new(Method::POST, errors("set-under-analysis"))
          .body(json!({ "object_id": id }))
      }
      Self::SetAllFixed => {
        MutationRequest::new(Method::POST, errors("set-all-fixed")).body(json!({}))
      }
      Self::SetAllUnderAnalysis => {
        MutationRequest::new(Method::POST, errors("set-all-under-analysis")).body(json!({}))
      }
      Self::ResetById { id } => {
        MutationRequest::new(Method::POST, recon(category).push("reset"))
          .body(json!({ "object_id": id }))
      }
      Self::ResetAll => {
        MutationRequest::new(Method::POST, recon(category).push("reset-all")).body(json!({}))
      }
      Self::DeleteById { id } => MutationRequest::new(Method::DELETE, recon(category).push(id)),
      Self::DeleteAll => MutationRequest::new(Method::DELETE, recon(category)),
      Self::RenameFile {
        old_filename,
        new_filename,
      } => {
        let bucket: FtpBucket = category.parse()?;
        MutationRequest::new(Method::PUT, ftp(bucket, "rename"))
          .query("old_filename", old_filename)
          .query("new_filename", new_filename)
      }
      Self::DeleteFile { filename } => {
        let bucket: FtpBucket = category.parse()?;
        MutationRequest::new(Method::DELETE, ftp(bucket, "delete")).query("filename", filename)
      }
    };
    Ok(request)
  }
}

fn errors(action: &str) -> ApiPath {
  ApiPath::new("/api/errors").push(action)
}

fn recon(category: &str) -> ApiPath {
  ApiPath::new("/api/recon").push(category)
}

fn ftp(bucket: FtpBucket, action: &str) -> ApiPath {
  ApiPath::new("/api/ftp").push(bucket.as_str()).push(action)
}

/// Backend calls that change or export data rather than list it.
#[async_trait]
pub trait MutationTransport: Send + Sync {
  /// Perform a mutation; any non-success status is an error.
  async fn perform(&self, request: &MutationRequest) -> Result<()>;

  /// Raw content of an FTP file.
  async fn download(&self, bucket: FtpBucket, filename: &str) -> Result<Vec<u8>>;

  /// Forward `payload` to the producer API under `apipath`.
  async fn produce(&self, apipath: &str, payload: &Value) -> Result<Value>;
}

#[async_trait]
impl MutationTransport for ApiClient {
  async fn perform(&self, request: &MutationRequest) -> Result<()> {
    let query: Vec<(&str, &str)> = request
      .query
      .iter()
      .map(|(name, value)| (*name, value.as_str()))
      .collect();

    self
      .execute(
        request.method.clone(),
        &request.path,
        &query,
        request.body.as_ref(),
      )
      .await?;
    Ok(())
  }

  async fn download(&self, bucket: FtpBucket, filename: &str) -> Result<Vec<u8>> {
    self
      .get_bytes(&ftp(bucket, "download"), &[("filename", filename)])
      .await
  }

  async fn produce(&self, apipath: &str, payload: &Value) -> Result<Value> {
    self
      .post_json(
        &ApiPath::new("/api/producer/send"),
        &json!({ "apipath": apipath, "payload": payload }),
      )
      .await
  }
}
