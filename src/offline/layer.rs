//! Cache layer that applies the request policy against storage and network.

use futures::future::try_join_all;
use serde_json::Value;
use tracing::{debug, info, warn};
use url::Url;

use super::network::Network;
use super::policy::{self, Plan, Policy};
use super::storage::AssetStorage;
use super::types::{AssetResponse, Served};
use crate::error::{NetworkError, TableError};

/// Name of the versioned cache for `version`.
pub fn cache_name(version: &str) -> String {
  format!("invtab-{}", version)
}

/// Offline cache for the dataset document and the static asset bundle.
///
/// The dataset URL is fetched network-first and every successful fetch
/// refreshes its cached copy; bundle entries are served cache-first.
pub struct OfflineCache<N: Network, A: AssetStorage> {
  network: N,
  storage: A,
  policy: Policy,
  cache_name: String,
  bundle: Vec<Url>,
}

impl<N: Network, A: AssetStorage> OfflineCache<N, A> {
  /// `bundle` lists the assets precached on install; the dataset is always
  /// part of it.
  pub fn new(network: N, storage: A, dataset: Url, cache_version: &str, bundle: Vec<Url>) -> Self {
    let mut all = vec![dataset.clone()];
    for url in bundle {
      if !all.contains(&url) {
        all.push(url);
      }
    }

    Self {
      network,
      storage,
      policy: Policy::new(dataset),
      cache_name: cache_name(cache_version),
      bundle: all,
    }
  }

  /// Whether every bundle entry is already in the current cache.
  pub fn is_installed(&self) -> Result<bool, TableError> {
    for url in &self.bundle {
      if self.storage.lookup(&self.cache_name, url)?.is_none() {
        return Ok(false);
      }
    }
    Ok(true)
  }

  /// Precache the whole bundle into the current cache.
  ///
  /// Nothing is written unless every entry was fetched.
  pub async fn install(&self) -> Result<usize, TableError> {
    let responses = try_join_all(self.bundle.iter().map(|url| self.network.fetch(url))).await?;

    for response in &responses {
      self.storage.put(&self.cache_name, response)?;
    }

    info!(
      "Precached {} assets into {}",
      responses.len(),
      self.cache_name
    );
    Ok(responses.len())
  }

  /// Delete every cache other than the current one. Returns the removed names.
  pub fn activate(&self) -> Result<Vec<String>, TableError> {
    let names = self.storage.cache_names()?;
    let stale = policy::stale_caches(&self.cache_name, &names);

    for name in &stale {
      self.storage.delete_cache(name)?;
      info!("Deleted stale cache {}", name);
    }

    Ok(stale)
  }

  /// Fetch `url` through the cache.
  pub async fn fetch(&self, url: &Url) -> Result<Served, TableError> {
    let strategy = self.policy.strategy_for(url);

    let cached = match self.storage.lookup(&self.cache_name, url) {
      Ok(cached) => cached,
      Err(e) => {
        warn!("Cache lookup for {} failed, treating as miss: {}", url, e);
        None
      }
    };

    let fallback = match policy::plan(strategy, cached) {
      Plan::Serve(hit) => {
        debug!("Cache hit for {}", url);
        return Ok(Served::from_cache(hit));
      }
      Plan::Fetch { fallback, .. } => fallback,
    };

    debug!("Fetching {} ({:?})", url, strategy);
    let network = self.network.fetch(url).await;
    if let Err(e) = &network {
      warn!("Network fetch of {} failed: {}", url, e);
    }

    let outcome = policy::complete(url, strategy, fallback, network);

    if let Some(update) = &outcome.update {
      // Serving the fresh copy matters more than caching it
      if let Err(e) = self.storage.put(&self.cache_name, update) {
        warn!("Failed to cache {}: {}", url, e);
      }
    }

    Ok(outcome.result?)
  }

  /// Fetch the dataset document and decode it as JSON.
  pub async fn fetch_dataset(&self) -> Result<(Value, Served), TableError> {
    let url = self.policy.dataset().clone();
    let served = self.fetch(&url).await?;
    let doc = decode_json(&served.response)?;
    Ok((doc, served))
  }

  /// Drop every cache, the current one included.
  pub fn clear_all(&self) -> Result<(), TableError> {
    self.storage.clear_all()?;
    info!("Cleared all asset caches");
    Ok(())
  }
}

fn decode_json(response: &AssetResponse) -> Result<Value, NetworkError> {
  serde_json::from_slice(&response.body)
    .map_err(|e| NetworkError::Decode(format!("{}: {}", response.url, e)))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::db::Database;
  use crate::error::ErrorKind;
  use crate::offline::storage::SqliteAssetStorage;
  use crate::offline::types::ServeSource;
  use std::collections::HashMap;
  use std::future::Future;
  use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
  use std::sync::{Arc, Mutex};

  const DATA: &str = "http://localhost/app/data.json";
  const CSS: &str = "http://localhost/app/app.css";

  #[derive(Clone, Default)]
  struct FakeNetwork {
    bodies: Arc<Mutex<HashMap<String, String>>>,
    offline: Arc<AtomicBool>,
    calls: Arc<AtomicUsize>,
  }

  impl FakeNetwork {
    fn serve(&self, url: &str, body: &str) {
      self
        .bodies
        .lock()
        .unwrap()
        .insert(url.to_string(), body.to_string());
    }

    fn set_offline(&self, offline: bool) {
      self.offline.store(offline, Ordering::SeqCst);
    }

    fn calls(&self) -> usize {
      self.calls.load(Ordering::SeqCst)
    }
  }

  impl Network for FakeNetwork {
    fn fetch(
      &self,
      url: &Url,
    ) -> impl Future<Output = Result<AssetResponse, NetworkError>> + Send {
      self.calls.fetch_add(1, Ordering::SeqCst);
      let result = if self.offline.load(Ordering::SeqCst) {
        Err(NetworkError::Request {
          url: url.to_string(),
          message: "offline".to_string(),
        })
      } else {
        match self.bodies.lock().unwrap().get(url.as_str()) {
          Some(body) => Ok(AssetResponse {
            url: url.clone(),
            content_type: None,
            body: body.as_bytes().to_vec(),
          }),
          None => Err(NetworkError::Status {
            url: url.to_string(),
            status: 404,
          }),
        }
      };
      async move { result }
    }
  }

  fn url(s: &str) -> Url {
    Url::parse(s).unwrap()
  }

  fn cache_with(
    network: FakeNetwork,
    version: &str,
  ) -> (OfflineCache<FakeNetwork, SqliteAssetStorage>, SqliteAssetStorage) {
    let storage = SqliteAssetStorage::new(Database::open_in_memory().unwrap());
    let cache = OfflineCache::new(
      network,
      storage.clone(),
      url(DATA),
      version,
      vec![url(CSS)],
    );
    (cache, storage)
  }

  #[test]
  fn test_cache_name() {
    assert_eq!(cache_name("v1"), "invtab-v1");
  }

  #[tokio::test]
  async fn test_install_precaches_bundle() {
    let network = FakeNetwork::default();
    network.serve(DATA, r#"{"rows":[]}"#);
    network.serve(CSS, "body{}");
    let (cache, storage) = cache_with(network, "v1");

    assert_eq!(cache.install().await.unwrap(), 2);
    assert_eq!(storage.len("invtab-v1").unwrap(), 2);
  }

  #[tokio::test]
  async fn test_install_is_all_or_nothing() {
    let network = FakeNetwork::default();
    network.serve(DATA, r#"{"rows":[]}"#);
    let (cache, storage) = cache_with(network, "v1");

    let err = cache.install().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Network);
    assert_eq!(storage.len("invtab-v1").unwrap(), 0);
  }

  #[tokio::test]
  async fn test_is_installed() {
    let network = FakeNetwork::default();
    network.serve(DATA, "{}");
    network.serve(CSS, "x");
    let (cache, _) = cache_with(network, "v1");

    assert!(!cache.is_installed().unwrap());

    // A dataset fetch alone leaves the bundle incomplete
    cache.fetch_dataset().await.unwrap();
    assert!(!cache.is_installed().unwrap());

    cache.install().await.unwrap();
    assert!(cache.is_installed().unwrap());
  }

  #[tokio::test]
  async fn test_activate_drops_old_versions() {
    let network = FakeNetwork::default();
    network.serve(DATA, "{}");
    network.serve(CSS, "x");

    let (old, storage) = cache_with(network.clone(), "v1");
    old.install().await.unwrap();

    let new = OfflineCache::new(network, storage.clone(), url(DATA), "v2", vec![url(CSS)]);
    new.install().await.unwrap();

    assert_eq!(new.activate().unwrap(), ["invtab-v1"]);
    assert_eq!(storage.cache_names().unwrap(), ["invtab-v2"]);
  }

  #[tokio::test]
  async fn test_dataset_is_network_first() {
    let network = FakeNetwork::default();
    network.serve(DATA, r#"{"v":1}"#);
    let (cache, _) = cache_with(network.clone(), "v1");

    let (doc, served) = cache.fetch_dataset().await.unwrap();
    assert_eq!(doc["v"], 1);
    assert_eq!(served.source, ServeSource::Network);

    // A second fetch goes to the network again and refreshes the copy
    network.serve(DATA, r#"{"v":2}"#);
    let (doc, _) = cache.fetch_dataset().await.unwrap();
    assert_eq!(doc["v"], 2);
    assert_eq!(network.calls(), 2);

    network.set_offline(true);
    let (doc, served) = cache.fetch_dataset().await.unwrap();
    assert_eq!(doc["v"], 2);
    assert_eq!(served.source, ServeSource::Offline);
  }

  #[tokio::test]
  async fn test_offline_without_copy_is_network_error() {
    let network = FakeNetwork::default();
    network.set_offline(true);
    let (cache, _) = cache_with(network, "v1");

    let err = cache.fetch_dataset().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Network);
  }

  #[tokio::test]
  async fn test_bundle_is_cache_first() {
    let network = FakeNetwork::default();
    network.serve(DATA, "{}");
    network.serve(CSS, "old");
    let (cache, _) = cache_with(network.clone(), "v1");
    cache.install().await.unwrap();
    let calls = network.calls();

    network.serve(CSS, "new");
    let served = cache.fetch(&url(CSS)).await.unwrap();
    assert_eq!(served.source, ServeSource::Cache);
    assert_eq!(served.response.body, b"old");
    assert_eq!(network.calls(), calls);
  }

  #[tokio::test]
  async fn test_cache_first_miss_is_not_stored() {
    let network = FakeNetwork::default();
    let other = "http://localhost/app/logo.png";
    network.serve(other, "png");
    let (cache, storage) = cache_with(network, "v1");

    let served = cache.fetch(&url(other)).await.unwrap();
    assert_eq!(served.source, ServeSource::Network);
    assert_eq!(storage.len("invtab-v1").unwrap(), 0);
  }

  #[tokio::test]
  async fn test_undecodable_dataset() {
    let network = FakeNetwork::default();
    network.serve(DATA, "not json");
    let (cache, _) = cache_with(network, "v1");

    let err = cache.fetch_dataset().await.unwrap_err();
    assert!(matches!(err, TableError::Network(NetworkError::Decode(_))));
  }

  #[tokio::test]
  async fn test_clear_all() {
    let network = FakeNetwork::default();
    network.serve(DATA, "{}");
    network.serve(CSS, "x");
    let (cache, storage) = cache_with(network, "v1");
    cache.install().await.unwrap();

    cache.clear_all().unwrap();
    assert!(storage.cache_names().unwrap().is_empty());
  }
}
