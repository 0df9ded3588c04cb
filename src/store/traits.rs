//! Core traits for the record store.

use serde::{de::DeserializeOwned, Serialize};

use crate::error::StorageError;

/// Named collection inside the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Collection {
  Rows,
  Meta,
  Comments,
}

impl Collection {
  pub const ALL: [Collection; 3] = [Collection::Rows, Collection::Meta, Collection::Comments];

  pub fn as_str(self) -> &'static str {
    match self {
      Collection::Rows => "rows",
      Collection::Meta => "meta",
      Collection::Comments => "comments",
    }
  }
}

/// Trait for values that live in one collection of the store.
///
/// The key is derived from the value itself (row id, setting name, group
/// name), so `put` is always an upsert of a complete snapshot.
pub trait StoredRecord: Serialize + DeserializeOwned {
  /// Collection the value belongs to
  fn collection() -> Collection;

  /// Key of this value within its collection
  fn store_key(&self) -> String;
}

/// Trait for durable store backends.
pub trait Store {
  /// Insert or replace a record, returning once the write is durable.
  fn put<T: StoredRecord>(&self, record: &T) -> Result<(), StorageError>;

  /// Every record in `T`'s collection. Callers must not rely on the order.
  fn get_all<T: StoredRecord>(&self) -> Result<Vec<T>, StorageError>;

  /// A single record by key.
  fn get<T: StoredRecord>(&self, key: &str) -> Result<Option<T>, StorageError>;

  /// Remove every record in a collection.
  fn clear(&self, collection: Collection) -> Result<(), StorageError>;
}
