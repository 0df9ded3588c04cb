//! Asset cache storage trait and SQLite implementation.

use rusqlite::{params, OptionalExtension};
use sha2::{Digest, Sha256};
use url::Url;

use super::types::AssetResponse;
use crate::db::Database;
use crate::error::StorageError;

/// Named caches of asset responses, keyed by URL.
pub trait AssetStorage: Send + Sync {
  /// Store a response under `cache`, replacing any previous copy.
  fn put(&self, cache: &str, response: &AssetResponse) -> Result<(), StorageError>;

  /// Look up the cached response for `url` in `cache`.
  fn lookup(&self, cache: &str, url: &Url) -> Result<Option<AssetResponse>, StorageError>;

  /// Names of all caches that hold at least one entry.
  fn cache_names(&self) -> Result<Vec<String>, StorageError>;

  /// Drop every entry of `cache`.
  fn delete_cache(&self, cache: &str) -> Result<(), StorageError>;

  /// Drop every cache.
  fn clear_all(&self) -> Result<(), StorageError>;
}

/// Stable key for a URL. Fragments never reach the network, so they are
/// ignored.
pub fn url_hash(url: &Url) -> String {
  let mut url = url.clone();
  url.set_fragment(None);

  let mut hasher = Sha256::new();
  hasher.update(url.as_str().as_bytes());
  hex::encode(hasher.finalize())
}

/// Asset storage backed by the `asset_cache` table.
#[derive(Clone)]
pub struct SqliteAssetStorage {
  db: Database,
}

impl SqliteAssetStorage {
  pub fn new(db: Database) -> Self {
    Self { db }
  }

  #[cfg(test)]
  pub fn len(&self, cache: &str) -> Result<usize, StorageError> {
    self.db.with_conn(|conn| {
      let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM asset_cache WHERE cache_name = ?1",
        params![cache],
        |row| row.get(0),
      )?;
      Ok(count as usize)
    })
  }
}

impl AssetStorage for SqliteAssetStorage {
  fn put(&self, cache: &str, response: &AssetResponse) -> Result<(), StorageError> {
    let hash = url_hash(&response.url);

    self.db.with_conn(|conn| {
      conn.execute(
        "INSERT OR REPLACE INTO asset_cache (cache_name, url_hash, url, content_type, body, cached_at)
         VALUES (?1, ?2, ?3, ?4, ?5, datetime('now'))",
        params![
          cache,
          hash,
          response.url.as_str(),
          response.content_type,
          response.body
        ],
      )?;
      Ok(())
    })
  }

  fn lookup(&self, cache: &str, url: &Url) -> Result<Option<AssetResponse>, StorageError> {
    let hash = url_hash(url);

    let row: Option<(String, Option<String>, Vec<u8>)> = self.db.with_conn(|conn| {
      Ok(
        conn
          .query_row(
            "SELECT url, content_type, body FROM asset_cache
             WHERE cache_name = ?1 AND url_hash = ?2",
            params![cache, hash],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
          )
          .optional()?,
      )
    })?;

    let Some((stored_url, content_type, body)) = row else {
      return Ok(None);
    };

    let url = Url::parse(&stored_url)
      .map_err(|e| StorageError::Unavailable(format!("bad cached url {}: {}", stored_url, e)))?;

    Ok(Some(AssetResponse {
      url,
      content_type,
      body,
    }))
  }

  fn cache_names(&self) -> Result<Vec<String>, StorageError> {
    self.db.with_conn(|conn| {
      let mut stmt =
        conn.prepare("SELECT DISTINCT cache_name FROM asset_cache ORDER BY cache_name")?;
      let names = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
      Ok(names)
    })
  }

  fn delete_cache(&self, cache: &str) -> Result<(), StorageError> {
    self.db.with_conn(|conn| {
      conn.execute(
        "DELETE FROM asset_cache WHERE cache_name = ?1",
        params![cache],
      )?;
      Ok(())
    })
  }

  fn clear_all(&self) -> Result<(), StorageError> {
    self.db.with_conn(|conn| {
      conn.execute("DELETE FROM asset_cache", [])?;
      Ok(())
    })
  }

}

#[cfg(test)]
mod tests {
  use super::*;

  fn storage() -> SqliteAssetStorage {
    SqliteAssetStorage::new(Database::open_in_memory().unwrap())
  }

  fn asset(url: &str, body: &str) -> AssetResponse {
    AssetResponse {
      url: Url::parse(url).unwrap(),
      content_type: Some("application/json".to_string()),
      body: body.as_bytes().to_vec(),
    }
  }

  #[test]
  fn test_url_hash_ignores_fragment() {
    let a = Url::parse("http://localhost/data.json").unwrap();
    let b = Url::parse("http://localhost/data.json#top").unwrap();
    let c = Url::parse("http://localhost/data.json?v=1").unwrap();
    assert_eq!(url_hash(&a), url_hash(&b));
    assert_ne!(url_hash(&a), url_hash(&c));
    assert_eq!(url_hash(&a).len(), 64);
  }

  #[test]
  fn test_put_and_lookup() {
    let storage = storage();
    let data = asset("http://localhost/data.json", "[]");

    storage.put("invtab-v1", &data).unwrap();

    assert_eq!(storage.lookup("invtab-v1", &data.url).unwrap(), Some(data.clone()));
    assert_eq!(storage.lookup("invtab-v2", &data.url).unwrap(), None);
  }

  #[test]
  fn test_put_replaces() {
    let storage = storage();
    storage.put("c", &asset("http://localhost/a", "old")).unwrap();
    storage.put("c", &asset("http://localhost/a", "new")).unwrap();

    let url = Url::parse("http://localhost/a").unwrap();
    assert_eq!(storage.lookup("c", &url).unwrap().unwrap().body, b"new");
    assert_eq!(storage.len("c").unwrap(), 1);
  }

  #[test]
  fn test_cache_names_and_delete() {
    let storage = storage();
    storage.put("invtab-v1", &asset("http://localhost/a", "1")).unwrap();
    storage.put("invtab-v2", &asset("http://localhost/a", "2")).unwrap();

    assert_eq!(storage.cache_names().unwrap(), ["invtab-v1", "invtab-v2"]);

    storage.delete_cache("invtab-v1").unwrap();
    assert_eq!(storage.cache_names().unwrap(), ["invtab-v2"]);
    assert_eq!(storage.len("invtab-v1").unwrap(), 0);

    storage.clear_all().unwrap();
    assert!(storage.cache_names().unwrap().is_empty());
  }
}
