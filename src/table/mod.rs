//! In-memory inventory table with write-through persistence.
//!
//! The table is loaded once (resumed from the store or seeded from a
//! document), then mutated only through `TableManager`. Every mutation
//! updates memory first and then writes complete record snapshots to the
//! store; there is no batching and no rollback.

mod collate;
mod groups;
mod manager;
mod meta;
mod record;
mod snapshot;

pub use collate::Locale;
pub use groups::{Group, GroupKey};
pub use manager::{LoadReport, LoadSource, TableManager, TableOptions};
pub use meta::Comment;
pub use record::Record;

#[cfg(test)]
pub use manager::SeedReason;

/// Format version of persisted data. Stored data with any other version is
/// discarded and the table is reseeded.
pub const FORMAT_VERSION: &str = "2";
