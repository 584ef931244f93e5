//! JSON key/value cache over a [`SessionStore`].

use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;

use super::keys::{domain_prefixes, Domain, CLEAR_ALL_MARKER};
use super::traits::{CacheLookup, SessionStore};
use crate::error::Result;

/// JSON (de)serializing view of a session store.
///
/// Parse failures are reported as [`CacheLookup::Corrupt`]; deciding what to
/// do about them is left to the caller.
pub struct KeyValueCache<S: SessionStore> {
  store: Arc<S>,
}

impl<S: SessionStore> KeyValueCache<S> {
  pub fn new(store: Arc<S>) -> Self {
    Self { store }
  }

  /// The underlying store.
  pub fn store(&self) -> &Arc<S> {
    &self.store
  }

  /// Read and parse the entry under `key`.
  pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<CacheLookup<T>> {
    let raw = match self.store.get_item(key)? {
      Some(raw) => raw,
      None => return Ok(CacheLookup::Absent),
    };

    Ok(match serde_json::from_str(&raw) {
      Ok(value) => CacheLookup::Hit(value),
      Err(e) => CacheLookup::Corrupt(e),
    })
  }

  /// Serialize `value` and store it under `key`, overwriting unconditionally.
  pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
    let json = serde_json::to_string(value)?;
    self.store.set_item(key, &json)
  }

  pub fn remove(&self, key: &str) -> Result<()> {
    self.store.remove_item(key)
  }

  /// Remove every key matching `predicate`. Returns how many were removed.
  pub fn sweep<P>(&self, predicate: P) -> Result<usize>
  where
    P: Fn(&str) -> bool,
  {
    let mut removed = 0;
    for key in self.store.keys()? {
      if predicate(&key) {
        self.store.remove_item(&key)?;
        removed += 1;
      }
    }
    Ok(removed)
  }

  /// Remove every key starting with `prefix`.
  pub fn sweep_prefix(&self, prefix: &str) -> Result<usize> {
    self.sweep(|key| key.starts_with(prefix))
  }

  /// Drop every cached collection and count.
  pub fn clear_all(&self) -> Result<usize> {
    self.sweep_prefix(CLEAR_ALL_MARKER)
  }

  /// Drop the unified data and count entries of one domain.
  pub fn clear_domain(&self, domain: Domain) -> Result<usize> {
    let prefixes = domain_prefixes(domain);
    self.sweep(|key| prefixes.iter().any(|p| key.starts_with(p.as_str())))
  }
}

impl<S: SessionStore> Clone for KeyValueCache<S> {
  fn clone(&self) -> Self {
    Self {
      store: Arc::clone(&self.store),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::MemoryStore;
  use serde_json::json;

  fn cache() -> KeyValueCache<MemoryStore> {
    KeyValueCache::new(Arc::new(MemoryStore::new()))
  }

  #[test]
  fn test_get_absent_hit_and_corrupt() {
    let cache = cache();
    assert!(matches!(cache.get::<u64>("k").unwrap(), CacheLookup::Absent));

    cache.set("k", &json!([{ "_id": "1" }])).unwrap();
    let hit = cache.get::<Vec<serde_json::Value>>("k").unwrap();
    assert_eq!(hit.ok().map(|v| v.len()), Some(1));

    cache.store().set_item("k", "not json").unwrap();
    assert!(matches!(
      cache.get::<Vec<serde_json::Value>>("k").unwrap(),
      CacheLookup::Corrupt(_)
    ));
    // Reading never removes anything on its own
    assert!(cache.store().get_item("k").unwrap().is_some());
  }

  #[test]
  fn test_count_is_stored_as_plain_integer_text() {
    let cache = cache();
    cache.set("EVENT_COUNT_error_a", &7u64).unwrap();
    assert_eq!(
      cache.store().get_item("EVENT_COUNT_error_a").unwrap().as_deref(),
      Some("7")
    );
  }

  #[test]
  fn test_sweep_prefix() {
    let cache = cache();
    cache.set("EVENTS_error_a", &json!([])).unwrap();
    cache.set("EVENT_COUNT_error_a", &0u64).unwrap();
    cache.set("theme", &"dark").unwrap();

    assert_eq!(cache.sweep_prefix("EVENT").unwrap(), 2);
    assert_eq!(cache.store().keys().unwrap(), vec!["theme"]);
    assert_eq!(cache.sweep_prefix("EVENT").unwrap(), 0);
  }

  #[test]
  fn test_clear_domain_leaves_other_domains() {
    let cache = cache();
    cache.set("EVENTS_error_a", &json!([])).unwrap();
    cache.set("EVENT_COUNT_error_a", &1u64).unwrap();
    cache.set("EVENTS_ftp_recon_ftp", &json!([])).unwrap();
    cache.set("EVENTS_mainstaging", &json!([])).unwrap();

    assert_eq!(cache.clear_domain(Domain::Error).unwrap(), 2);
    assert_eq!(
      cache.store().keys().unwrap(),
      vec!["EVENTS_ftp_recon_ftp", "EVENTS_mainstaging"]
    );

    assert_eq!(cache.clear_all().unwrap(), 2);
    assert!(cache.store().keys().unwrap().is_empty());
  }
}
