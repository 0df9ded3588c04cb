//! SQLite implementation of the record store.

use rusqlite::{params, OptionalExtension};

use super::traits::{Collection, Store, StoredRecord};
use crate::db::Database;
use crate::error::StorageError;

/// Record store backed by the `kv_store` table.
#[derive(Clone)]
pub struct SqliteStore {
  db: Database,
}

impl SqliteStore {
  pub fn new(db: Database) -> Self {
    Self { db }
  }
}

impl Store for SqliteStore {
  fn put<T: StoredRecord>(&self, record: &T) -> Result<(), StorageError> {
    let collection = T::collection().as_str();
    let key = record.store_key();
    let data = serde_json::to_vec(record)?;

    // Upsert keeps the original rowid, so get_all stays in creation order
    self.db.with_conn(|conn| {
      conn.execute(
        "INSERT INTO kv_store (collection, record_key, data, stored_at)
         VALUES (?1, ?2, ?3, datetime('now'))
         ON CONFLICT(collection, record_key)
         DO UPDATE SET data = excluded.data, stored_at = excluded.stored_at",
        params![collection, key, data],
      )?;
      Ok(())
    })
  }

  fn get_all<T: StoredRecord>(&self) -> Result<Vec<T>, StorageError> {
    let collection = T::collection().as_str();

    self.db.with_conn(|conn| {
      let mut stmt =
        conn.prepare("SELECT data FROM kv_store WHERE collection = ?1 ORDER BY rowid")?;
      let blobs = stmt
        .query_map(params![collection], |row| row.get::<_, Vec<u8>>(0))?
        .collect::<Result<Vec<_>, _>>()?;

      blobs
        .iter()
        .map(|data| serde_json::from_slice(data).map_err(StorageError::from))
        .collect()
    })
  }

  fn get<T: StoredRecord>(&self, key: &str) -> Result<Option<T>, StorageError> {
    let collection = T::collection().as_str();

    let data: Option<Vec<u8>> = self.db.with_conn(|conn| {
      Ok(
        conn
          .query_row(
            "SELECT data FROM kv_store WHERE collection = ?1 AND record_key = ?2",
            params![collection, key],
            |row| row.get(0),
          )
          .optional()?,
      )
    })?;

    match data {
      Some(data) => Ok(Some(serde_json::from_slice(&data)?)),
      None => Ok(None),
    }
  }

  fn clear(&self, collection: Collection) -> Result<(), StorageError> {
    self.db.with_conn(|conn| {
      conn.execute(
        "DELETE FROM kv_store WHERE collection = ?1",
        params![collection.as_str()],
      )?;
      Ok(())
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde::{Deserialize, Serialize};

  #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
  struct Note {
    name: String,
    body: String,
  }

  impl StoredRecord for Note {
    fn collection() -> Collection {
      Collection::Comments
    }

    fn store_key(&self) -> String {
      self.name.clone()
    }
  }

  fn note(name: &str, body: &str) -> Note {
    Note {
      name: name.to_string(),
      body: body.to_string(),
    }
  }

  fn store() -> SqliteStore {
    SqliteStore::new(Database::open_in_memory().unwrap())
  }

  #[test]
  fn test_put_then_get() {
    let store = store();
    store.put(&note("a", "first")).unwrap();

    assert_eq!(store.get::<Note>("a").unwrap(), Some(note("a", "first")));
    assert_eq!(store.get::<Note>("missing").unwrap(), None);
  }

  #[test]
  fn test_put_is_upsert_and_keeps_creation_order() {
    let store = store();
    store.put(&note("a", "1")).unwrap();
    store.put(&note("b", "2")).unwrap();
    store.put(&note("a", "3")).unwrap();

    let all: Vec<Note> = store.get_all().unwrap();
    assert_eq!(all, vec![note("a", "3"), note("b", "2")]);
  }

  #[test]
  fn test_clear_only_touches_one_collection() {
    let store = store();
    store.put(&note("a", "1")).unwrap();
    store.clear(Collection::Rows).unwrap();
    assert_eq!(store.get_all::<Note>().unwrap().len(), 1);

    store.clear(Collection::Comments).unwrap();
    assert!(store.get_all::<Note>().unwrap().is_empty());
  }
}
