mod app;
mod cache;
mod commands;
mod config;
mod dispatch;
mod error;
mod logging;
mod payload;
mod remote;
#[cfg(test)]
mod testing;

use clap::Parser;
use color_eyre::Result;
use std::path::PathBuf;
use std::sync::Arc;

use cache::{MemoryStore, SqliteStorage};
use remote::{ApiClient, EnvToken};

#[derive(Parser, Debug)]
#[command(name = "reconview")]
#[command(about = "Browse and act on reconciliation dashboard records")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/reconview/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Keep the session cache in memory for this run only
  #[arg(long)]
  ephemeral: bool,

  /// Log at debug level
  #[arg(short, long)]
  verbose: bool,

  #[command(subcommand)]
  command: commands::Command,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  let config = config::Config::load(args.config.as_deref())?;
  let _log_guard = logging::init(config.log.dir.as_deref(), args.verbose)?;

  let api = ApiClient::new(config.api.base_url.as_str(), Arc::new(EnvToken))?;

  if args.ephemeral {
    let app = app::App::new(Arc::new(MemoryStore::new()), api);
    app.run(args.command).await
  } else {
    let storage = SqliteStorage::open(config.session.path.as_deref())?;
    let app = app::App::new(Arc::new(storage), api);
    app.run(args.command).await
  }
}
