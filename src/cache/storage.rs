//! Session store implementations: in-memory and SQLite.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::traits::{SessionStore, StoredEntry};
use crate::error::{Error, Result};

/// Process-local store. Used for ephemeral sessions and in tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
  items: Mutex<BTreeMap<String, (String, DateTime<Utc>)>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }
}

impl SessionStore for MemoryStore {
  fn get_item(&self, key: &str) -> Result<Option<String>> {
    let items = self.items.lock().map_err(|_| Error::LockPoisoned)?;
    Ok(items.get(key).map(|(value, _)| value.clone()))
  }

  fn set_item(&self, key: &str, value: &str) -> Result<()> {
    let mut items = self.items.lock().map_err(|_| Error::LockPoisoned)?;
    items.insert(key.to_string(), (value.to_string(), Utc::now()));
    Ok(())
  }

  fn remove_item(&self, key: &str) -> Result<()> {
    let mut items = self.items.lock().map_err(|_| Error::LockPoisoned)?;
    items.remove(key);
    Ok(())
  }

  fn keys(&self) -> Result<Vec<String>> {
    let items = self.items.lock().map_err(|_| Error::LockPoisoned)?;
    Ok(items.keys().cloned().collect())
  }

  fn entries(&self) -> Result<Vec<StoredEntry>> {
    let items = self.items.lock().map_err(|_| Error::LockPoisoned)?;
    Ok(
      items
        .iter()
        .map(|(key, (value, stored_at))| StoredEntry {
          key: key.clone(),
          size: value.len(),
          stored_at: *stored_at,
        })
        .collect(),
    )
  }
}

/// SQLite-based session store; entries survive between CLI invocations
/// until they are invalidated or swept.
pub struct SqliteStorage {
  conn: Mutex<Connection>,
}

/// Schema for the session table.
const SESSION_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS session_store (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    stored_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;

impl SqliteStorage {
  /// Open the store at `path`, or at the default location.
  pub fn open(path: Option<&Path>) -> color_eyre::Result<Self> {
    use color_eyre::eyre::eyre;

    let path = match path {
      Some(p) => p.to_path_buf(),
      None => Self::default_path()?,
    };

    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)
        .map_err(|e| eyre!("Failed to create session directory: {}", e))?;
    }

    let conn = Connection::open(&path)
      .map_err(|e| eyre!("Failed to open session store at {}: {}", path.display(), e))?;

    Ok(Self::with_connection(conn)?)
  }

  /// Open a store that lives only as long as this value.
  #[cfg(test)]
  pub fn open_in_memory() -> Result<Self> {
    Self::with_connection(Connection::open_in_memory()?)
  }

  fn with_connection(conn: Connection) -> Result<Self> {
    conn.execute_batch(SESSION_SCHEMA)?;
    Ok(Self {
      conn: Mutex::new(conn),
    })
  }

  /// Get the default database path.
  fn default_path() -> color_eyre::Result<PathBuf> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| color_eyre::eyre::eyre!("Could not determine data directory"))?;

    Ok(data_dir.join("reconview").join("session.db"))
  }
}

impl SessionStore for SqliteStorage {
  fn get_item(&self, key: &str) -> Result<Option<String>> {
    let conn = self.conn.lock().map_err(|_| Error::LockPoisoned)?;
    let value = conn
      .query_row(
        "SELECT value FROM session_store WHERE key = ?",
        params![key],
        |row| row.get(0),
      )
      .optional()?;
    Ok(value)
  }

  fn set_item(&self, key: &str, value: &str) -> Result<()> {
    let conn = self.conn.lock().map_err(|_| Error::LockPoisoned)?;
    conn.execute(
      "INSERT OR REPLACE INTO session_store (key, value, stored_at)
       VALUES (?, ?, datetime('now'))",
      params![key, value],
    )?;
    Ok(())
  }

  fn remove_item(&self, key: &str) -> Result<()> {
    let conn = self.conn.lock().map_err(|_| Error::LockPoisoned)?;
    conn.execute("DELETE FROM session_store WHERE key = ?", params![key])?;
    Ok(())
  }

  fn keys(&self) -> Result<Vec<String>> {
    let conn = self.conn.lock().map_err(|_| Error::LockPoisoned)?;
    let mut stmt = conn.prepare("SELECT key FROM session_store ORDER BY key")?;
    let keys = stmt
      .query_map([], |row| row.get(0))?
      .collect::<rusqlite::Result<Vec<String>>>()?;
    Ok(keys)
  }

  fn entries(&self) -> Result<Vec<StoredEntry>> {
    let conn = self.conn.lock().map_err(|_| Error::LockPoisoned)?;
    let mut stmt = conn.prepare(
      "SELECT key, length(CAST(value AS BLOB)), stored_at FROM session_store ORDER BY key",
    )?;

    let rows = stmt.query_map([], |row| {
      Ok((
        row.get::<_, String>(0)?,
        row.get::<_, i64>(1)?,
        row.get::<_, String>(2)?,
      ))
    })?;

    let mut entries = Vec::new();
    for row in rows {
      let (key, size, stored_at) = row?;
      entries.push(StoredEntry {
        key,
        size: usize::try_from(size).unwrap_or_default(),
        stored_at: parse_datetime(&stored_at),
      });
    }
    Ok(entries)
  }
}

/// Parse a datetime string from SQLite format ("YYYY-MM-DD HH:MM:SS").
fn parse_datetime(s: &str) -> DateTime<Utc> {
  chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
    .map(|dt| dt.and_utc())
    .unwrap_or_default()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_memory_store_roundtrip() {
    let store = MemoryStore::new();
    store.set_item("EVENTS_error_a", "[]").unwrap();
    assert_eq!(store.get_item("EVENTS_error_a").unwrap().as_deref(), Some("[]"));

    store.remove_item("EVENTS_error_a").unwrap();
    assert_eq!(store.get_item("EVENTS_error_a").unwrap(), None);

    // Removing again is a no-op
    store.remove_item("EVENTS_error_a").unwrap();
  }

  #[test]
  fn test_sqlite_store_overwrites_and_lists() {
    let store = SqliteStorage::open_in_memory().unwrap();
    store.set_item("EVENT_COUNT_ftp_recon_ftp", "2").unwrap();
    store.set_item("EVENT_COUNT_ftp_recon_ftp", "5").unwrap();
    store.set_item("EVENTS_ftp_recon_ftp", "[\"a.csv\"]").unwrap();

    assert_eq!(
      store.get_item("EVENT_COUNT_ftp_recon_ftp").unwrap().as_deref(),
      Some("5")
    );
    assert_eq!(
      store.keys().unwrap(),
      vec!["EVENTS_ftp_recon_ftp", "EVENT_COUNT_ftp_recon_ftp"]
    );

    let entries = store.entries().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].size, "[\"a.csv\"]".len());
  }

  #[test]
  fn test_sqlite_remove_absent_key_is_noop() {
    let store = SqliteStorage::open_in_memory().unwrap();
    store.remove_item("missing").unwrap();
    assert_eq!(store.get_item("missing").unwrap(), None);
  }
}
