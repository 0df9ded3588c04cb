//! Startup and reset sequence shared by the TUI and the CLI subcommands.

use chrono::Utc;
use color_eyre::{eyre::eyre, Result};
use futures::future::{FutureExt, LocalBoxFuture};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::db::Database;
use crate::error::TableError;
use crate::offline::{HttpNetwork, OfflineCache, ServeSource, SqliteAssetStorage};
use crate::store::SqliteStore;
use crate::table::{LoadReport, TableManager};

pub type Table = TableManager<SqliteStore>;
type Assets = OfflineCache<HttpNetwork, SqliteAssetStorage>;

/// An opened inventory: the loaded table plus the asset cache behind it.
pub struct Session {
  table: Table,
  assets: Assets,
  backfill: Vec<String>,
  backup_dir: PathBuf,
  report: LoadReport,
  seed_source: Option<ServeSource>,
  backup: Option<PathBuf>,
  loaded: bool,
}

impl Session {
  pub async fn open(config: &Config) -> Result<Self> {
    let db_path = config.database_path()?;
    let db = Database::open(&db_path)?;
    info!("Opened database at {}", db_path.display());

    let assets = OfflineCache::new(
      HttpNetwork::new()?,
      SqliteAssetStorage::new(db.clone()),
      config.dataset_url()?,
      &config.cache_version,
      config.asset_urls()?,
    );
    refresh_assets(&assets).await;

    let mut seed_source = None;
    let (table, report) = TableManager::load(
      SqliteStore::new(db),
      config.table_options(),
      seed_from(&assets, &mut seed_source),
    )
    .await
    .map_err(|e| eyre!("Failed to load inventory: {}", e))?;

    let backup_dir = db_path
      .parent()
      .map(Path::to_path_buf)
      .unwrap_or_else(|| PathBuf::from("."));

    let mut session = Self {
      table,
      assets,
      backfill: config.backfill_columns.clone(),
      backup_dir,
      report,
      seed_source,
      backup: None,
      loaded: true,
    };
    session.after_load()?;
    Ok(session)
  }

  /// Drop all local data and asset caches, then load from the seed again.
  ///
  /// If the reload fails the session stays unloaded: the stored data is
  /// already gone and the table must not be used.
  pub async fn reset(&mut self) -> Result<()> {
    self.loaded = false;
    self.table.reset_all()?;
    self.assets.clear_all()?;
    refresh_assets(&self.assets).await;

    let mut seed_source = None;
    self.report = self
      .table
      .reload(seed_from(&self.assets, &mut seed_source))
      .await
      .map_err(|e| eyre!("Failed to reload inventory: {}", e))?;
    self.seed_source = seed_source;
    self.backup = None;

    self.after_load()?;
    self.loaded = true;
    Ok(())
  }

  fn after_load(&mut self) -> Result<()> {
    for column in &self.backfill {
      if self.table.ensure_column(column)? {
        info!("Backfilled column {}", column);
      }
    }

    if let Some(doc) = &self.report.discarded {
      let path = write_backup(&self.backup_dir, doc)?;
      warn!("Discarded stored data saved to {}", path.display());
      self.backup = Some(path);
    }

    Ok(())
  }

  /// False after a reset whose reload failed.
  pub fn is_loaded(&self) -> bool {
    self.loaded
  }

  fn ensure_loaded(&self) -> Result<()> {
    if self.loaded {
      Ok(())
    } else {
      Err(eyre!("Inventory is not loaded"))
    }
  }

  pub fn table(&self) -> &Table {
    &self.table
  }

  pub fn table_mut(&mut self) -> &mut Table {
    &mut self.table
  }

  pub fn report(&self) -> &LoadReport {
    &self.report
  }

  /// Where the seed came from, if the table was seeded this time.
  pub fn seed_source(&self) -> Option<ServeSource> {
    self.seed_source
  }

  /// Backup written because of a format version mismatch.
  pub fn backup_path(&self) -> Option<&Path> {
    self.backup.as_deref()
  }

  /// Export the table as a pretty-printed document.
  pub fn export_json(&self) -> Result<String> {
    self.ensure_loaded()?;
    let doc = self.table.export_snapshot().to_document();
    serde_json::to_string_pretty(&doc).map_err(|e| eyre!("Failed to encode export: {}", e))
  }

  /// Replace the table with the document at `path`.
  pub fn import_file(&mut self, path: &Path) -> Result<usize> {
    self.ensure_loaded()?;
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read {}: {}", path.display(), e))?;
    let doc: Value = serde_json::from_str(&contents)
      .map_err(|e| eyre!("Failed to parse {}: {}", path.display(), e))?;
    Ok(self.table.import_snapshot(&doc)?)
  }
}

/// Precache the bundle unless the current cache already holds it, then drop
/// older caches. The table works without the cache, so failures are only
/// logged.
async fn refresh_assets(assets: &Assets) {
  let installed = match assets.is_installed() {
    Ok(installed) => installed,
    Err(e) => {
      warn!("Failed to inspect asset cache: {}", e);
      return;
    }
  };

  if installed {
    debug!("Asset cache already installed");
  } else if let Err(e) = assets.install().await {
    warn!("Failed to precache assets: {}", e);
    return;
  }

  if let Err(e) = assets.activate() {
    warn!("Failed to drop stale asset caches: {}", e);
  }
}

/// Seed loader fetching the dataset through the cache and recording where
/// it was served from.
fn seed_from<'a>(
  assets: &'a Assets,
  source: &'a mut Option<ServeSource>,
) -> impl FnOnce() -> LocalBoxFuture<'a, Result<Value, TableError>> {
  move || {
    async move {
      let (doc, served) = assets.fetch_dataset().await?;
      if served.source == ServeSource::Offline {
        warn!("Dataset unreachable, seeding from cached copy");
      }
      *source = Some(served.source);
      Ok(doc)
    }
    .boxed_local()
  }
}

fn write_backup(dir: &Path, doc: &Value) -> Result<PathBuf> {
  std::fs::create_dir_all(dir)
    .map_err(|e| eyre!("Failed to create backup directory {}: {}", dir.display(), e))?;

  let path = dir.join(format!(
    "backup-{}.json",
    Utc::now().format("%Y%m%d-%H%M%S%.3f")
  ));
  let contents =
    serde_json::to_string_pretty(doc).map_err(|e| eyre!("Failed to encode backup: {}", e))?;
  std::fs::write(&path, contents)
    .map_err(|e| eyre!("Failed to write backup {}: {}", path.display(), e))?;

  Ok(path)
}
