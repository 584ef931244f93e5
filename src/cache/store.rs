//! Read-through record store with invalidate-on-write.

use std::collections::BTreeMap;
use tracing::{debug, error, warn};

use super::keys::{Domain, KeyLayout, ScopeKey};
use super::kv::KeyValueCache;
use super::traits::{CacheLookup, SessionStore};
use crate::error::Result;
use crate::payload;
use crate::remote::{payload_str, Record, RecordSource};

/// Cached view of one domain's collections.
///
/// Holds the records of the category fetched last, the counts of every
/// category seen, an optional selected record and the last fetch error.
///
/// Reads go through the session cache:
/// 1. Data entry present and parseable: serve it, leave counts alone
/// 2. Otherwise drop the entry, fetch remotely, cache the result and
///    refresh the count
///
/// Remote fetch failures are recorded in [`api_error`](Self::api_error)
/// rather than returned. The `Result` of each operation only reports a
/// failing session store.
pub struct CachedRecordStore<S: SessionStore, R: RecordSource> {
  domain: Domain,
  layout: KeyLayout,
  cache: KeyValueCache<S>,
  source: R,
  records: Vec<Record>,
  selected_record: Option<Record>,
  api_error: Option<String>,
  counts: BTreeMap<String, u64>,
}

impl<S: SessionStore, R: RecordSource> CachedRecordStore<S, R> {
  /// Create a store using the unified key layout.
  pub fn new(domain: Domain, cache: KeyValueCache<S>, source: R) -> Self {
    Self {
      domain,
      layout: KeyLayout::Unified,
      cache,
      source,
      records: Vec::new(),
      selected_record: None,
      api_error: None,
      counts: BTreeMap::new(),
    }
  }

  /// Use a different key layout.
  pub fn with_layout(mut self, layout: KeyLayout) -> Self {
    self.layout = layout;
    self
  }

  pub fn domain(&self) -> Domain {
    self.domain
  }

  pub fn records(&self) -> &[Record] {
    &self.records
  }

  pub fn selected_record(&self) -> Option<&Record> {
    self.selected_record.as_ref()
  }

  pub fn api_error(&self) -> Option<&str> {
    self.api_error.as_deref()
  }

  pub fn counts(&self) -> &BTreeMap<String, u64> {
    &self.counts
  }

  pub fn count(&self, category: &str) -> Option<u64> {
    self.counts.get(category).copied()
  }

  #[cfg(test)]
  pub fn source(&self) -> &R {
    &self.source
  }

  fn scope(&self, category: &str) -> ScopeKey {
    ScopeKey::new(self.domain, category)
  }

  /// Load the records of `category`, from cache when possible.
  pub async fn fetch(&mut self, category: &str) -> Result<()> {
    let scope = self.scope(category);
    let data_key = self.layout.data_key(&scope);

    match self.cache.get::<Vec<Record>>(&data_key)? {
      CacheLookup::Hit(records) => {
        debug!(%scope, records = records.len(), "cache hit");
        self.records = records;
        self.selected_record = None;
        self.api_error = None;
        return Ok(());
      }
      CacheLookup::Corrupt(e) => {
        warn!(%scope, key = %data_key, error = %e, "discarding unreadable cache entry");
      }
      CacheLookup::Absent => debug!(%scope, "cache miss"),
    }

    self.cache.remove(&data_key)?;

    match self.source.fetch_records(&scope).await {
      Ok(records) => {
        self.records = records;
        self.selected_record = None;
        self.api_error = None;
        self.cache.set(&data_key, &self.records)?;
        // Fresh data always comes with a fresh count
        self.cache.remove(&self.layout.count_key(&scope))?;
        self.fetch_count(category).await?;
      }
      Err(e) => {
        error!(%scope, error = %e, "fetch failed");
        self.api_error = Some(e.api_message());
      }
    }

    Ok(())
  }

  /// Count of `category`, from cache when possible.
  ///
  /// A failed remote count reads as 0 and is not cached, so the next call
  /// asks the backend again.
  pub async fn fetch_count(&mut self, category: &str) -> Result<u64> {
    let scope = self.scope(category);
    let count_key = self.layout.count_key(&scope);

    match self.cache.get::<u64>(&count_key)? {
      CacheLookup::Hit(count) => {
        self.counts.insert(category.to_string(), count);
        return Ok(count);
      }
      CacheLookup::Corrupt(e) => {
        warn!(%scope, key = %count_key, error = %e, "discarding unreadable count entry");
        self.cache.remove(&count_key)?;
      }
      CacheLookup::Absent => {}
    }

    let count = match self.source.fetch_count(&scope).await {
      Ok(count) => {
        let count = count.unwrap_or(0);
        self.cache.set(&count_key, &count)?;
        count
      }
      Err(e) => {
        warn!(%scope, error = %e, "count fetch failed");
        0
      }
    };

    self.counts.insert(category.to_string(), count);
    Ok(count)
  }

  /// Drop both cache entries of `category`, then fetch it remotely.
  pub async fn refresh(&mut self, category: &str) -> Result<()> {
    self.invalidate(category)?;
    self.fetch(category).await
  }

  /// Remove the data and count entries of `category`.
  pub fn invalidate(&self, category: &str) -> Result<()> {
    let scope = self.scope(category);
    self.cache.remove(&self.layout.data_key(&scope))?;
    self.cache.remove(&self.layout.count_key(&scope))?;
    Ok(())
  }

  pub fn select_record(&mut self, record: Record) {
    self.selected_record = Some(record);
  }

  /// Selected record's payload formatted for display.
  ///
  /// Only reconciliation records carry payloads; other domains yield `None`.
  pub fn parsed_payload(&self) -> Option<String> {
    if self.domain != Domain::Reconciliation {
      return None;
    }

    Some(payload::format_payload(
      self.selected_record.as_ref().and_then(payload_str),
    ))
  }
}
