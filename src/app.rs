use color_eyre::{eyre::eyre, Result};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cache::{CachedRecordStore, Domain, KeyLayout, KeyValueCache, SessionStore};
use crate::commands::{CacheAction, Command, ErrorAction, FtpAction, ReconAction};
use crate::dispatch::MutationDispatcher;
use crate::remote::{record_id, ApiClient, HttpRecordSource, Record};

type Store<S> = CachedRecordStore<S, HttpRecordSource>;

/// Main application state
pub struct App<S: SessionStore> {
  cache: KeyValueCache<S>,
  api: ApiClient,
  dispatcher: MutationDispatcher<ApiClient>,
}

impl<S: SessionStore> App<S> {
  pub fn new(session: Arc<S>, api: ApiClient) -> Self {
    Self {
      cache: KeyValueCache::new(session),
      dispatcher: MutationDispatcher::new(api.clone()),
      api,
    }
  }

  /// Record store for `domain`; `legacy` selects the reconciliation-only
  /// key layout and routes.
  fn store(&self, domain: Domain, legacy: bool) -> Result<Store<S>> {
    if !legacy {
      let source = HttpRecordSource::new(self.api.clone());
      return Ok(CachedRecordStore::new(domain, self.cache.clone(), source));
    }

    if domain != Domain::Reconciliation {
      return Err(eyre!("--legacy only applies to the reconciliation domain"));
    }
    let source = HttpRecordSource::legacy(self.api.clone());
    Ok(
      CachedRecordStore::new(domain, self.cache.clone(), source)
        .with_layout(KeyLayout::SingleDomain),
    )
  }

  pub async fn run(&self, command: Command) -> Result<()> {
    match command {
      Command::Records {
        domain,
        category,
        refresh,
        legacy,
      } => {
        let mut store = self.store(domain, legacy)?;
        if refresh {
          store.refresh(&category).await?;
        } else {
          store.fetch(&category).await?;
        }
        check_api_error(&store)?;

        let count = store.fetch_count(&category).await?;
        print_json(&json!({ "records": store.records(), "count": count }))
      }
      Command::Count {
        domain,
        category,
        legacy,
      } => {
        let mut store = self.store(domain, legacy)?;
        println!("{}", store.fetch_count(&category).await?);
        Ok(())
      }
      Command::Show {
        domain,
        category,
        index,
        legacy,
      } => {
        let mut store = self.store(domain, legacy)?;
        let record = self.pick(&mut store, &category, index).await?;
        store.select_record(record.clone());

        match store.parsed_payload() {
          Some(payload) => println!("{}", payload),
          None => print_json(&record)?,
        }
        Ok(())
      }
      Command::Error(action) => self.run_error_action(action).await,
      Command::Recon(action) => self.run_recon_action(action).await,
      Command::Ftp(action) => self.run_ftp_action(action).await,
      Command::Resend {
        category,
        index,
        legacy,
      } => {
        let mut store = self.store(Domain::Reconciliation, legacy)?;
        let record = self.pick(&mut store, &category, index).await?;
        tracing::info!(id = record_id(&record).unwrap_or("-"), "resending record");
        let reply = self.dispatcher.resend(&record).await?;
        print_json(&reply)
      }
      Command::Cache(action) => self.run_cache_action(action),
    }
  }

  async fn run_error_action(&self, action: ErrorAction) -> Result<()> {
    let mut store = self.store(Domain::Error, false)?;
    let category = match action {
      ErrorAction::SetFixed { category, id } => {
        self.dispatcher.set_fixed(&mut store, &category, &id).await?;
        category
      }
      ErrorAction::SetUnderAnalysis { category, id } => {
        self
          .dispatcher
          .set_under_analysis(&mut store, &category, &id)
          .await?;
        category
      }
      ErrorAction::SetAllFixed { category } => {
        self.dispatcher.set_all_fixed(&mut store, &category).await?;
        category
      }
      ErrorAction::SetAllUnderAnalysis { category } => {
        self
          .dispatcher
          .set_all_under_analysis(&mut store, &category)
          .await?;
        category
      }
    };
    report_refreshed(&store, &category)
  }

  async fn run_recon_action(&self, action: ReconAction) -> Result<()> {
    let mut store = self.store(Domain::Reconciliation, false)?;
    let category = match action {
      ReconAction::Reset { category, id } => {
        self.dispatcher.reset_by_id(&mut store, &category, &id).await?;
        category
      }
      ReconAction::ResetAll { category } => {
        self.dispatcher.reset_all(&mut store, &category).await?;
        category
      }
      ReconAction::Delete { category, id } => {
        self.dispatcher.delete_by_id(&mut store, &category, &id).await?;
        category
      }
      ReconAction::DeleteAll { category } => {
        self.dispatcher.delete_all(&mut store, &category).await?;
        category
      }
    };
    report_refreshed(&store, &category)
  }

  async fn run_ftp_action(&self, action: FtpAction) -> Result<()> {
    let mut store = self.store(Domain::Ftp, false)?;
    match action {
      FtpAction::Rename {
        bucket,
        old_filename,
        new_filename,
      } => {
        self
          .dispatcher
          .rename_file(&mut store, bucket, &old_filename, &new_filename)
          .await?;
        report_refreshed(&store, bucket.as_str())
      }
      FtpAction::Delete { bucket, filename } => {
        self
          .dispatcher
          .delete_file(&mut store, bucket, &filename)
          .await?;
        report_refreshed(&store, bucket.as_str())
      }
      FtpAction::Download {
        bucket,
        filename,
        output,
      } => {
        let bytes = self.dispatcher.download_file(bucket, &filename).await?;
        let output = output.unwrap_or_else(|| default_download_path(&filename));
        std::fs::write(&output, &bytes)
          .map_err(|e| eyre!("Failed to write {}: {}", output.display(), e))?;
        println!("{} bytes written to {}", bytes.len(), output.display());
        Ok(())
      }
    }
  }

  fn run_cache_action(&self, action: CacheAction) -> Result<()> {
    match action {
      CacheAction::Ls => {
        for entry in self.cache.store().entries()? {
          println!(
            "{}  {:>8}  {}",
            entry.stored_at.format("%Y-%m-%d %H:%M:%S"),
            entry.size,
            entry.key
          );
        }
      }
      CacheAction::Clear { domain } => {
        let removed = match domain {
          Some(domain) => self.cache.clear_domain(domain)?,
          None => self.cache.clear_all()?,
        };
        println!("{} entries removed", removed);
      }
    }
    Ok(())
  }

  /// Fetch `category` and return the record at `index`.
  async fn pick(&self, store: &mut Store<S>, category: &str, index: usize) -> Result<Record> {
    store.fetch(category).await?;
    check_api_error(store)?;

    store.records().get(index).cloned().ok_or_else(|| {
      eyre!(
        "No record at index {} ({} records in {})",
        index,
        store.records().len(),
        category
      )
    })
  }
}

fn check_api_error<S: SessionStore>(store: &Store<S>) -> Result<()> {
  match store.api_error() {
    Some(message) => Err(eyre!("{}", message)),
    None => Ok(()),
  }
}

/// Summary printed after a mutation refreshed its scope.
fn report_refreshed<S: SessionStore>(store: &Store<S>, category: &str) -> Result<()> {
  check_api_error(store)?;
  println!(
    "{}/{}: {} records, count {}",
    store.domain(),
    category,
    store.records().len(),
    store.count(category).unwrap_or_default()
  );
  Ok(())
}

fn default_download_path(filename: &str) -> PathBuf {
  Path::new(filename)
    .file_name()
    .map(PathBuf::from)
    .unwrap_or_else(|| PathBuf::from("download.bin"))
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
  println!("{}", serde_json::to_string_pretty(value)?);
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::MemoryStore;
  use crate::testing::StaticToken;

  #[test]
  fn test_legacy_store_is_reconciliation_only() {
    let api = ApiClient::new(
      "https://dash.example.org",
      Arc::new(StaticToken("t".to_string())),
    )
    .unwrap();
    let app = App::new(Arc::new(MemoryStore::new()), api);

    assert!(app.store(Domain::Reconciliation, true).is_ok());
    assert!(app.store(Domain::Error, true).is_err());
  }

  #[test]
  fn test_default_download_path_strips_directories() {
    assert_eq!(
      default_download_path("2024/06/recon.csv"),
      PathBuf::from("recon.csv")
    );
    assert_eq!(default_download_path(".."), PathBuf::from("download.bin"));
  }
}
