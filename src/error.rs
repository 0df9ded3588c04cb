//! Error types shared by the store, the table manager and the offline cache.

use std::path::PathBuf;
use thiserror::Error;

/// Failure of the durable key-value medium.
#[derive(Debug, Error)]
pub enum StorageError {
  #[error("failed to open store at {path}: {source}")]
  Open {
    path: PathBuf,
    #[source]
    source: rusqlite::Error,
  },
  #[error("store query failed: {0}")]
  Sqlite(#[from] rusqlite::Error),
  #[error("failed to encode or decode stored record: {0}")]
  Codec(#[from] serde_json::Error),
  #[error("store lock poisoned")]
  Poisoned,
  #[error("store unavailable: {0}")]
  Unavailable(String),
}

/// Failure to obtain an asset from the network with no cached copy to fall back on.
#[derive(Debug, Clone, Error)]
pub enum NetworkError {
  #[error("request to {url} failed: {message}")]
  Request { url: String, message: String },
  #[error("{url} answered with status {status}")]
  Status { url: String, status: u16 },
  #[error("{url} is not cached and the network is unavailable: {message}")]
  Offline { url: String, message: String },
  #[error("invalid seed document: {0}")]
  Decode(String),
}

/// Coarse classification used by the UI to decide how to report a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  Storage,
  Network,
  Validation,
  NotFound,
}

#[derive(Debug, Error)]
pub enum TableError {
  #[error("storage error: {0}")]
  Storage(#[from] StorageError),
  #[error(
    "storage error during {operation}: {written} of {total} rows saved, local data may be partially migrated: {source}"
  )]
  PartialWrite {
    operation: &'static str,
    written: usize,
    total: usize,
    #[source]
    source: StorageError,
  },
  #[error("network error: {0}")]
  Network(#[from] NetworkError),
  #[error("{0}")]
  Validation(String),
  #[error("not found: {0}")]
  NotFound(String),
}

impl TableError {
  pub fn kind(&self) -> ErrorKind {
    match self {
      TableError::Storage(_) | TableError::PartialWrite { .. } => ErrorKind::Storage,
      TableError::Network(_) => ErrorKind::Network,
      TableError::Validation(_) => ErrorKind::Validation,
      TableError::NotFound(_) => ErrorKind::NotFound,
    }
  }

  pub(crate) fn validation(message: impl Into<String>) -> Self {
    TableError::Validation(message.into())
  }

  pub(crate) fn not_found(message: impl Into<String>) -> Self {
    TableError::NotFound(message.into())
  }
}
