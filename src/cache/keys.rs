//! Scope keys and the session cache key naming convention.
//!
//! Every cached collection lives under two keys: a data entry holding the
//! records and a count entry holding the remote count. The names must stay
//! byte-for-byte compatible with sessions written by the dashboard:
//!
//! - unified store: `EVENTS_{domain}_{category}` / `EVENT_COUNT_{domain}_{category}`
//! - single-domain store: `EVENTS_{category}` / `EVENT_COUNT_{category}`

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

pub const EVENTS_PREFIX: &str = "EVENTS";
pub const EVENT_COUNT_PREFIX: &str = "EVENT_COUNT";

/// Marker shared by both prefixes; sweeping it clears the whole cache.
pub const CLEAR_ALL_MARKER: &str = "EVENT";

/// Record family served by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, clap::ValueEnum)]
pub enum Domain {
  Reconciliation,
  Error,
  Ftp,
}

impl Domain {
  /// Name used inside cache keys.
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Reconciliation => "reconciliation",
      Self::Error => "error",
      Self::Ftp => "ftp",
    }
  }

  /// Path segment of the backend routes for this domain.
  pub fn route_prefix(self) -> &'static str {
    match self {
      Self::Reconciliation => "recon",
      Self::Error => "errors",
      Self::Ftp => "ftp",
    }
  }
}

impl fmt::Display for Domain {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Domain {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "reconciliation" => Ok(Self::Reconciliation),
      "error" => Ok(Self::Error),
      "ftp" => Ok(Self::Ftp),
      other => Err(Error::InvalidInput(format!("unknown domain '{}'", other))),
    }
  }
}

/// Identifies one cached collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScopeKey {
  pub domain: Domain,
  pub category: String,
}

impl ScopeKey {
  pub fn new(domain: Domain, category: impl Into<String>) -> Self {
    Self {
      domain,
      category: category.into(),
    }
  }
}

impl fmt::Display for ScopeKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}/{}", self.domain, self.category)
  }
}

/// How cache key names are derived from a scope.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum KeyLayout {
  /// `{PREFIX}_{domain}_{category}`
  #[default]
  Unified,
  /// `{PREFIX}_{category}`, used by the reconciliation-only store
  SingleDomain,
}

impl KeyLayout {
  pub fn data_key(self, scope: &ScopeKey) -> String {
    self.key(EVENTS_PREFIX, scope)
  }

  pub fn count_key(self, scope: &ScopeKey) -> String {
    self.key(EVENT_COUNT_PREFIX, scope)
  }

  fn key(self, prefix: &str, scope: &ScopeKey) -> String {
    match self {
      Self::Unified => format!("{}_{}_{}", prefix, scope.domain, scope.category),
      Self::SingleDomain => format!("{}_{}", prefix, scope.category),
    }
  }
}

/// Key prefixes covering every unified entry of a domain, data and count.
pub fn domain_prefixes(domain: Domain) -> [String; 2] {
  [
    format!("{}_{}_", EVENTS_PREFIX, domain),
    format!("{}_{}_", EVENT_COUNT_PREFIX, domain),
  ]
}
