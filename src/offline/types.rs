//! Core types for the offline asset cache.

use url::Url;

/// A fetched or cached asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetResponse {
  pub url: Url,
  pub content_type: Option<String>,
  pub body: Vec<u8>,
}

/// Response together with where it came from.
#[derive(Debug, Clone)]
pub struct Served {
  pub response: AssetResponse,
  pub source: ServeSource,
}

impl Served {
  pub fn from_network(response: AssetResponse) -> Self {
    Self {
      response,
      source: ServeSource::Network,
    }
  }

  pub fn from_cache(response: AssetResponse) -> Self {
    Self {
      response,
      source: ServeSource::Cache,
    }
  }

  /// Network failed and a cached copy was served instead.
  pub fn offline(response: AssetResponse) -> Self {
    Self {
      response,
      source: ServeSource::Offline,
    }
  }
}

/// Indicates where a served asset came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServeSource {
  /// Fresh data from network
  Network,
  /// Cache hit on a cache-first asset
  Cache,
  /// Network unavailable, serving the cached copy
  Offline,
}
