//! Error types for the data layer.

use thiserror::Error;

use crate::cache::Domain;

/// Result type alias for the data layer.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the cache, the remote layer and the dispatcher.
#[derive(Error, Debug)]
pub enum Error {
  /// The backend answered with a non-success status.
  #[error("Server returned {status}: {status_text}")]
  Transport { status: u16, status_text: String },

  #[error("HTTP request failed: {0}")]
  Request(#[from] reqwest::Error),

  #[error("Invalid URL: {0}")]
  Url(#[from] url::ParseError),

  #[error("Session store error: {0}")]
  Storage(#[from] rusqlite::Error),

  #[error("JSON error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("Auth token unavailable: {0}")]
  Auth(String),

  #[error("{action} belongs to the {expected} domain, store serves {found}")]
  DomainMismatch {
    action: &'static str,
    expected: Domain,
    found: Domain,
  },

  #[error("Invalid input: {0}")]
  InvalidInput(String),

  #[error("Session store lock poisoned")]
  LockPoisoned,
}

impl Error {
  /// HTTP status text of the failure, if the backend produced one.
  pub fn status_text(&self) -> Option<&str> {
    match self {
      Self::Transport { status_text, .. } if !status_text.is_empty() => Some(status_text.as_str()),
      Self::Request(e) => e.status().and_then(|s| s.canonical_reason()),
      _ => None,
    }
  }

  /// Human-readable message stored as a store's `api_error`.
  pub fn api_message(&self) -> String {
    format!("Error: {}", self.status_text().unwrap_or("Unknown"))
  }
}
