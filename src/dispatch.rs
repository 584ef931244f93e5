//! Mutating actions and the cache invalidation that follows them.

use serde_json::{json, Value};
use tracing::info;

use crate::cache::{CachedRecordStore, SessionStore};
use crate::error::{Error, Result};
use crate::payload::decode_payload;
use crate::remote::{
  api_path, payload_str, FtpBucket, Mutation, MutationTransport, Record, RecordSource,
};

/// Runs backend mutations and refreshes the affected scope afterwards.
///
/// A failed mutation is returned to the caller and leaves the cache as it
/// was. Only a confirmed mutation invalidates and refetches.
pub struct MutationDispatcher<T: MutationTransport> {
  transport: T,
}

impl<T: MutationTransport> MutationDispatcher<T> {
  pub fn new(transport: T) -> Self {
    Self { transport }
  }

  #[cfg(test)]
  pub fn transport(&self) -> &T {
    &self.transport
  }

  /// Perform `mutation` on `category`, then refresh that scope in `store`.
  pub async fn dispatch<S, R>(
    &self,
    store: &mut CachedRecordStore<S, R>,
    category: &str,
    mutation: Mutation,
  ) -> Result<()>
  where
    S: SessionStore,
    R: RecordSource,
  {
    if mutation.domain() != store.domain() {
      return Err(Error::DomainMismatch {
        action: mutation.action(),
        expected: mutation.domain(),
        found: store.domain(),
      });
    }

    let request = mutation.request(category)?;
    self.transport.perform(&request).await?;

    info!(
      action = mutation.action(),
      domain = %store.domain(),
      category,
      "mutation applied, refreshing scope"
    );
    store.refresh(category).await
  }

  pub async fn set_fixed<S: SessionStore, R: RecordSource>(
    &self,
    store: &mut CachedRecordStore<S, R>,
    category: &str,
    id: &str,
  ) -> Result<()> {
    let mutation = Mutation::SetFixed { id: id.to_string() };
    self.dispatch(store, category, mutation).await
  }

  pub async fn set_under_analysis<S: SessionStore, R: RecordSource>(
    &self,
    store: &mut CachedRecordStore<S, R>,
    category: &str,
    id: &str,
  ) -> Result<()> {
    let mutation = Mutation::SetUnderAnalysis { id: id.to_string() };
    self.dispatch(store, category, mutation).await
  }

  pub async fn set_all_fixed<S: SessionStore, R: RecordSource>(
    &self,
    store: &mut CachedRecordStore<S, R>,
    category: &str,
  ) -> Result<()> {
    self.dispatch(store, category, Mutation::SetAllFixed).await
  }

  pub async fn set_all_under_analysis<S: SessionStore, R: RecordSource>(
    &self,
    store: &mut CachedRecordStore<S, R>,
    category: &str,
  ) -> Result<()> {
    self
      .dispatch(store, category, Mutation::SetAllUnderAnalysis)
      .await
  }

  pub async fn reset_by_id<S: SessionStore, R: RecordSource>(
    &self,
    store: &mut CachedRecordStore<S, R>,
    category: &str,
    id: &str,
  ) -> Result<()> {
    let mutation = Mutation::ResetById { id: id.to_string() };
    self.dispatch(store, category, mutation).await
  }

  pub async fn reset_all<S: SessionStore, R: RecordSource>(
    &self,
    store: &mut CachedRecordStore<S, R>,
    category: &str,
  ) -> Result<()> {
    self.dispatch(store, category, Mutation::ResetAll).await
  }

  pub async fn delete_by_id<S: SessionStore, R: RecordSource>(
    &self,
    store: &mut CachedRecordStore<S, R>,
    category: &str,
    id: &str,
  ) -> Result<()> {
    let mutation = Mutation::DeleteById { id: id.to_string() };
    self.dispatch(store, category, mutation).await
  }

  pub async fn delete_all<S: SessionStore, R: RecordSource>(
    &self,
    store: &mut CachedRecordStore<S, R>,
    category: &str,
  ) -> Result<()> {
    self.dispatch(store, category, Mutation::DeleteAll).await
  }

  pub async fn rename_file<S: SessionStore, R: RecordSource>(
    &self,
    store: &mut CachedRecordStore<S, R>,
    bucket: FtpBucket,
    old_filename: &str,
    new_filename: &str,
  ) -> Result<()> {
    let mutation = Mutation::RenameFile {
      old_filename: old_filename.to_string(),
      new_filename: new_filename.to_string(),
    };
    self.dispatch(store, bucket.as_str(), mutation).await
  }

  pub async fn delete_file<S: SessionStore, R: RecordSource>(
    &self,
    store: &mut CachedRecordStore<S, R>,
    bucket: FtpBucket,
    filename: &str,
  ) -> Result<()> {
    let mutation = Mutation::DeleteFile {
      filename: filename.to_string(),
    };
    self.dispatch(store, bucket.as_str(), mutation).await
  }

  /// File content is never cached; only the listing is.
  pub async fn download_file(&self, bucket: FtpBucket, filename: &str) -> Result<Vec<u8>> {
    self.transport.download(bucket, filename).await
  }

  pub async fn send_to_producer(&self, apipath: &str, payload: &Value) -> Result<Value> {
    info!(apipath, "sending payload to producer");
    self.transport.produce(apipath, payload).await
  }

  /// Re-send a reconciliation record's payload to the API path it came from.
  pub async fn resend(&self, record: &Record) -> Result<Value> {
    let apipath = api_path(record)
      .ok_or_else(|| Error::InvalidInput("record has no apipath".to_string()))?;

    let payload = match payload_str(record) {
      Some(raw) if !raw.is_empty() => {
        decode_payload(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
      }
      _ => json!({}),
    };

    self.send_to_producer(apipath, &payload).await
  }
}
