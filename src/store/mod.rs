//! Durable per-collection key-value store.
//!
//! The table manager mirrors every mutation into three collections:
//! - `rows`: one complete record snapshot per row id
//! - `meta`: column set, grouping column and format version
//! - `comments`: one comment per group name

#[cfg(test)]
mod memory;
mod sqlite;
mod traits;

#[cfg(test)]
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{Collection, Store, StoredRecord};
