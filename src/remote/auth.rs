//! Bearer token providers.

use async_trait::async_trait;

use crate::error::{Error, Result};

/// Environment variables checked for the API token, in order.
pub const TOKEN_VARS: &[&str] = &["RECONVIEW_TOKEN", "API_TOKEN"];

/// Supplies a bearer token on demand. Called once per request.
#[async_trait]
pub trait TokenProvider: Send + Sync {
  async fn token(&self) -> Result<String>;
}

/// Reads the token from the environment at every call.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvToken;

#[async_trait]
impl TokenProvider for EnvToken {
  async fn token(&self) -> Result<String> {
    TOKEN_VARS
      .iter()
      .find_map(|var| std::env::var(var).ok().filter(|v| !v.is_empty()))
      .ok_or_else(|| {
        Error::Auth(format!(
          "API token not found. Set {} environment variable.",
          TOKEN_VARS.join(" or ")
        ))
      })
  }
}
