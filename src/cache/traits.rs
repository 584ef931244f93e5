//! Core traits and types for the caching system.

use chrono::{DateTime, Utc};

use crate::error::Result;

/// A stored entry as listed by [`SessionStore::entries`].
#[derive(Debug, Clone)]
pub struct StoredEntry {
  pub key: String,
  /// Length of the raw value in bytes
  pub size: usize,
  pub stored_at: DateTime<Utc>,
}

/// Raw string storage backing the session cache.
///
/// Mirrors browser session storage: flat string keys, string values, no
/// expiry. Implementations use interior mutability so one store can be
/// shared by every record store in the process.
pub trait SessionStore: Send + Sync {
  /// Read the raw value under `key`.
  fn get_item(&self, key: &str) -> Result<Option<String>>;

  /// Write `value` under `key`, replacing any previous value.
  fn set_item(&self, key: &str, value: &str) -> Result<()>;

  /// Delete `key`. Deleting an absent key is not an error.
  fn remove_item(&self, key: &str) -> Result<()>;

  /// Every key currently stored.
  fn keys(&self) -> Result<Vec<String>>;

  /// Every entry with its size and write time, ordered by key.
  fn entries(&self) -> Result<Vec<StoredEntry>>;
}

/// Outcome of reading a JSON entry from the cache.
#[derive(Debug)]
pub enum CacheLookup<T> {
  /// Nothing stored under the key
  Absent,
  /// Stored and parsed
  Hit(T),
  /// Stored but not parseable as the expected type
  Corrupt(serde_json::Error),
}

impl<T> CacheLookup<T> {
  /// The parsed value, treating corruption like absence.
  pub fn ok(self) -> Option<T> {
    match self {
      CacheLookup::Hit(value) => Some(value),
      _ => None,
    }
  }
}
