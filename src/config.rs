use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use url::Url;

use crate::table::{Locale, TableOptions};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
  /// URL or path of the seed document
  #[serde(default = "default_dataset")]
  pub dataset: String,
  /// Base directory for relative dataset and asset paths
  #[serde(default = "default_asset_root")]
  pub asset_root: PathBuf,
  /// Extra bundle entries precached next to the dataset
  #[serde(default)]
  pub assets: Vec<String>,
  /// Bumping this invalidates every older asset cache
  #[serde(default = "default_cache_version")]
  pub cache_version: String,
  #[serde(default)]
  pub locale: Locale,
  /// Label of the group holding rows with an empty grouping value
  pub ungrouped_label: Option<String>,
  /// Columns added on every start when missing
  #[serde(default)]
  pub backfill_columns: Vec<String>,
  /// Database path (default: $XDG_DATA_HOME/invtab/inventory.db)
  pub database: Option<PathBuf>,
  /// Log file path (default: $XDG_DATA_HOME/invtab/invtab.log)
  pub log_file: Option<PathBuf>,
}

fn default_dataset() -> String {
  "data.json".to_string()
}

fn default_asset_root() -> PathBuf {
  PathBuf::from(".")
}

fn default_cache_version() -> String {
  "v1".to_string()
}

impl Default for Config {
  fn default() -> Self {
    Self {
      dataset: default_dataset(),
      asset_root: default_asset_root(),
      assets: Vec::new(),
      cache_version: default_cache_version(),
      locale: Locale::default(),
      ungrouped_label: None,
      backfill_columns: Vec::new(),
      database: None,
      log_file: None,
    }
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./invtab.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/invtab/config.yaml
  ///
  /// Without a config file the defaults are used.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Ok(Self::default()),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("invtab.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("invtab").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents).map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn parse(contents: &str) -> std::result::Result<Self, serde_yaml::Error> {
    // An empty file is a valid config with every default
    if contents.trim().is_empty() {
      return Ok(Self::default());
    }
    serde_yaml::from_str(contents)
  }

  /// Directory for the database, logs and backups.
  pub fn data_dir() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| eyre!("Could not determine data directory"))?;

    Ok(data_dir.join("invtab"))
  }

  pub fn database_path(&self) -> Result<PathBuf> {
    match &self.database {
      Some(path) => Ok(path.clone()),
      None => Ok(Self::data_dir()?.join("inventory.db")),
    }
  }

  pub fn log_path(&self) -> Result<PathBuf> {
    match &self.log_file {
      Some(path) => Ok(path.clone()),
      None => Ok(Self::data_dir()?.join("invtab.log")),
    }
  }

  pub fn table_options(&self) -> TableOptions {
    let mut options = TableOptions {
      locale: self.locale,
      ..TableOptions::default()
    };
    if let Some(label) = &self.ungrouped_label {
      options.ungrouped_label = label.clone();
    }
    options
  }

  pub fn dataset_url(&self) -> Result<Url> {
    self.resolve(&self.dataset)
  }

  pub fn asset_urls(&self) -> Result<Vec<Url>> {
    self.assets.iter().map(|a| self.resolve(a)).collect()
  }

  /// Turn a config entry into a URL. Absolute URLs pass through, anything
  /// else is a path relative to `asset_root`.
  fn resolve(&self, entry: &str) -> Result<Url> {
    if let Ok(url) = Url::parse(entry) {
      // Single-letter schemes are Windows drive letters
      if url.scheme().len() > 1 {
        return Ok(url);
      }
    }

    let mut path = self.asset_root.join(entry);
    if path.is_relative() {
      let cwd = std::env::current_dir()
        .map_err(|e| eyre!("Failed to read current directory: {}", e))?;
      path = cwd.join(path);
    }

    Url::from_file_path(&path).map_err(|_| eyre!("Invalid asset path: {}", path.display()))
  }
}
