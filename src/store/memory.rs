//! In-memory store used by tests, with switchable write failures.

use std::collections::BTreeMap;
use std::sync::Mutex;

use super::traits::{Collection, Store, StoredRecord};
use crate::error::StorageError;

#[derive(Default)]
struct Inner {
  next_seq: u64,
  records: BTreeMap<(Collection, String), (u64, Vec<u8>)>,
  /// Remaining successful puts before every write fails; None = never fail
  puts_left: Option<usize>,
}

#[derive(Default)]
pub struct MemoryStore {
  inner: Mutex<Inner>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Let `n` more puts succeed, then fail every write.
  pub fn fail_puts_after(&self, n: usize) {
    self.inner.lock().unwrap().puts_left = Some(n);
  }

  pub fn heal(&self) {
    self.inner.lock().unwrap().puts_left = None;
  }

  pub fn len(&self, collection: Collection) -> usize {
    let inner = self.inner.lock().unwrap();
    inner.records.keys().filter(|(c, _)| *c == collection).count()
  }
}

impl Store for MemoryStore {
  fn put<T: StoredRecord>(&self, record: &T) -> Result<(), StorageError> {
    let mut guard = self.inner.lock().map_err(|_| StorageError::Poisoned)?;
    let inner = &mut *guard;
    if let Some(n) = inner.puts_left.as_mut() {
      if *n == 0 {
        return Err(StorageError::Unavailable("injected failure".to_string()));
      }
      *n -= 1;
    }

    let data = serde_json::to_vec(record)?;
    let key = (T::collection(), record.store_key());
    let seq = match inner.records.get(&key) {
      Some((seq, _)) => *seq,
      None => {
        inner.next_seq += 1;
        inner.next_seq
      }
    };
    inner.records.insert(key, (seq, data));
    Ok(())
  }

  fn get_all<T: StoredRecord>(&self) -> Result<Vec<T>, StorageError> {
    let inner = self.inner.lock().map_err(|_| StorageError::Poisoned)?;
    let mut entries: Vec<&(u64, Vec<u8>)> = inner
      .records
      .iter()
      .filter(|((c, _), _)| *c == T::collection())
      .map(|(_, v)| v)
      .collect();
    entries.sort_by_key(|entry| entry.0);
    entries
      .into_iter()
      .map(|(_, data)| serde_json::from_slice(data).map_err(StorageError::from))
      .collect()
  }

  fn get<T: StoredRecord>(&self, key: &str) -> Result<Option<T>, StorageError> {
    let inner = self.inner.lock().map_err(|_| StorageError::Poisoned)?;
    match inner.records.get(&(T::collection(), key.to_string())) {
      Some((_, data)) => Ok(Some(serde_json::from_slice(data)?)),
      None => Ok(None),
    }
  }

  fn clear(&self, collection: Collection) -> Result<(), StorageError> {
    let mut inner = self.inner.lock().map_err(|_| StorageError::Poisoned)?;
    if inner.puts_left == Some(0) {
      return Err(StorageError::Unavailable("injected failure".to_string()));
    }
    inner.records.retain(|(c, _), _| *c != collection);
    Ok(())
  }
}
