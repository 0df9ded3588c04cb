mod schema;

use crate::error::StorageError;
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Shared SQLite connection backing both the table store and the asset cache.
///
/// Writes are serialised through the mutex; every statement runs in
/// autocommit mode, so a returned `Ok` means the write is durable.
#[derive(Clone)]
pub struct Database {
  conn: Arc<Mutex<Connection>>,
}

impl Database {
  /// Open or create the database at `path`
  pub fn open(path: &Path) -> Result<Self, StorageError> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).map_err(|e| {
        StorageError::Unavailable(format!(
          "failed to create database directory {}: {}",
          parent.display(),
          e
        ))
      })?;
    }

    let conn = Connection::open(path).map_err(|source| StorageError::Open {
      path: path.to_path_buf(),
      source,
    })?;

    Self::from_connection(conn)
  }

  #[cfg(test)]
  pub fn open_in_memory() -> Result<Self, StorageError> {
    Self::from_connection(Connection::open_in_memory()?)
  }

  fn from_connection(conn: Connection) -> Result<Self, StorageError> {
    conn.execute_batch(schema::SCHEMA)?;
    Ok(Self {
      conn: Arc::new(Mutex::new(conn)),
    })
  }

  /// Run `f` with exclusive access to the connection
  pub fn with_conn<T>(
    &self,
    f: impl FnOnce(&Connection) -> Result<T, StorageError>,
  ) -> Result<T, StorageError> {
    let conn = self.conn.lock().map_err(|_| StorageError::Poisoned)?;
    f(&conn)
  }
}
