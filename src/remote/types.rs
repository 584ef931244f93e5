use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// A backend record, kept opaque.
///
/// Event and error records are JSON objects; the FTP listing returns bare
/// file names. Only the collection as a whole is cached.
pub type Record = serde_json::Value;

/// Fields that identify a record, in lookup order.
const ID_FIELDS: &[&str] = &["_id", "eventid", "ticketNo"];

/// Identifier of a record, if it carries one.
pub fn record_id(record: &Record) -> Option<&str> {
  match record {
    Record::String(name) => Some(name),
    _ => ID_FIELDS
      .iter()
      .find_map(|field| record.get(field).and_then(|v| v.as_str())),
  }
}

/// Embedded payload string of a reconciliation record.
pub fn payload_str(record: &Record) -> Option<&str> {
  record.get("payloadstr").and_then(|v| v.as_str())
}

/// API path the record's payload was originally sent to.
pub fn api_path(record: &Record) -> Option<&str> {
  record.get("apipath").and_then(|v| v.as_str())
}

/// Body of the `/count` endpoints.
#[derive(Debug, Deserialize)]
pub struct CountResponse {
  #[serde(default)]
  pub count: Option<u64>,
}

/// FTP folders exposed by the backend. Doubles as the FTP category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum FtpBucket {
  #[value(name = "recon_ftp")]
  ReconFtp,
  #[value(name = "recon_ftp_archives")]
  ReconFtpArchives,
}

impl FtpBucket {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::ReconFtp => "recon_ftp",
      Self::ReconFtpArchives => "recon_ftp_archives",
    }
  }
}

impl fmt::Display for FtpBucket {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for FtpBucket {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "recon_ftp" => Ok(Self::ReconFtp),
      "recon_ftp_archives" => Ok(Self::ReconFtpArchives),
      other => Err(Error::InvalidInput(format!("unknown FTP bucket '{}'", other))),
    }
  }
}
