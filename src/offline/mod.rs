//! Offline asset cache: the dataset document is fetched network-first with a
//! cached fallback, the static bundle is served cache-first from a versioned
//! cache.

mod layer;
mod network;
mod policy;
mod storage;
mod types;

pub use layer::OfflineCache;
pub use network::HttpNetwork;
pub use storage::SqliteAssetStorage;
pub use types::ServeSource;
