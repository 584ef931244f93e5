//! Session cache for dashboard records.
//!
//! This module provides the read-through caching used by every record view:
//! - Collections are cached whole under a data key and a count key per scope
//! - Unreadable entries are dropped and refetched, never reported
//! - Entries have no expiry; mutations and explicit sweeps invalidate them

mod keys;
mod kv;
mod storage;
mod store;
mod traits;

pub use keys::{Domain, KeyLayout, ScopeKey};
pub use kv::KeyValueCache;
pub use storage::{MemoryStore, SqliteStorage};
pub use store::CachedRecordStore;
pub use traits::{CacheLookup, SessionStore};
