//! Command-line subcommands.

use clap::Subcommand;
use std::path::PathBuf;

use crate::cache::Domain;
use crate::remote::FtpBucket;

#[derive(Subcommand, Debug)]
pub enum Command {
  /// List the records of a category
  Records {
    domain: Domain,
    category: String,
    /// Drop the cached entries and fetch from the backend
    #[arg(long)]
    refresh: bool,
    /// Use the reconciliation-only key layout and routes
    #[arg(long)]
    legacy: bool,
  },
  /// Show the record count of a category
  Count {
    domain: Domain,
    category: String,
    #[arg(long)]
    legacy: bool,
  },
  /// Select a record by position and print its payload
  Show {
    domain: Domain,
    category: String,
    index: usize,
    #[arg(long)]
    legacy: bool,
  },
  /// Error record actions
  #[command(subcommand)]
  Error(ErrorAction),
  /// Reconciliation event actions
  #[command(subcommand)]
  Recon(ReconAction),
  /// FTP file actions
  #[command(subcommand)]
  Ftp(FtpAction),
  /// Re-send a reconciliation record to the producer API
  Resend {
    category: String,
    index: usize,
    #[arg(long)]
    legacy: bool,
  },
  /// Inspect or clear the session cache
  #[command(subcommand)]
  Cache(CacheAction),
}

#[derive(Subcommand, Debug)]
pub enum ErrorAction {
  SetFixed { category: String, id: String },
  SetUnderAnalysis { category: String, id: String },
  SetAllFixed { category: String },
  SetAllUnderAnalysis { category: String },
}

#[derive(Subcommand, Debug)]
pub enum ReconAction {
  Reset { category: String, id: String },
  ResetAll { category: String },
  Delete { category: String, id: String },
  DeleteAll { category: String },
}

#[derive(Subcommand, Debug)]
pub enum FtpAction {
  Rename {
    bucket: FtpBucket,
    old_filename: String,
    new_filename: String,
  },
  Delete { bucket: FtpBucket, filename: String },
  Download {
    bucket: FtpBucket,
    filename: String,
    /// Output file (defaults to the file name in the current directory)
    #[arg(short, long)]
    output: Option<PathBuf>,
  },
}

#[derive(Subcommand, Debug)]
pub enum CacheAction {
  /// List cached entries
  Ls,
  /// Remove cached entries
  Clear {
    /// Only clear this domain
    #[arg(long)]
    domain: Option<Domain>,
  },
}
