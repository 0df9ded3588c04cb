//! Request policy for the offline cache, free of I/O.
//!
//! A request is resolved in two pure steps: `plan` looks at the cached copy
//! and decides whether the network is needed, `complete` combines the
//! network result with the fallback and yields the response plus the cache
//! update to apply.

use url::Url;

use super::types::{AssetResponse, Served};
use crate::error::NetworkError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
  /// Dataset document: always try the network, refresh the cache on success
  NetworkFirst,
  /// Static bundle: serve from cache, go to the network only on a miss
  CacheFirst,
}

/// What to do for a request, given what is cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Plan {
  Serve(AssetResponse),
  Fetch {
    strategy: Strategy,
    fallback: Option<AssetResponse>,
  },
}

/// Result of a completed request and the cache write it implies.
#[derive(Debug)]
pub struct Outcome {
  pub result: Result<Served, NetworkError>,
  pub update: Option<AssetResponse>,
}

/// Chooses a strategy per request.
#[derive(Debug, Clone)]
pub struct Policy {
  dataset: Url,
}

impl Policy {
  pub fn new(dataset: Url) -> Self {
    Self { dataset }
  }

  pub fn dataset(&self) -> &Url {
    &self.dataset
  }

  pub fn strategy_for(&self, url: &Url) -> Strategy {
    if url.path() == self.dataset.path() {
      Strategy::NetworkFirst
    } else {
      Strategy::CacheFirst
    }
  }
}

pub fn plan(strategy: Strategy, cached: Option<AssetResponse>) -> Plan {
  match (strategy, cached) {
    (Strategy::CacheFirst, Some(hit)) => Plan::Serve(hit),
    (strategy, fallback) => Plan::Fetch { strategy, fallback },
  }
}

pub fn complete(
  url: &Url,
  strategy: Strategy,
  fallback: Option<AssetResponse>,
  network: Result<AssetResponse, NetworkError>,
) -> Outcome {
  match network {
    Ok(response) => {
      // Cache-first misses are passed through without being cached
      let update = match strategy {
        Strategy::NetworkFirst => Some(response.clone()),
        Strategy::CacheFirst => None,
      };
      Outcome {
        result: Ok(Served::from_network(response)),
        update,
      }
    }
    Err(err) => match fallback {
      Some(cached) => Outcome {
        result: Ok(Served::offline(cached)),
        update: None,
      },
      None => Outcome {
        result: Err(NetworkError::Offline {
          url: url.to_string(),
          message: err.to_string(),
        }),
        update: None,
      },
    },
  }
}

/// Caches other than `current`, which activation deletes.
pub fn stale_caches(current: &str, names: &[String]) -> Vec<String> {
  names.iter().filter(|n| *n != current).cloned().collect()
}
