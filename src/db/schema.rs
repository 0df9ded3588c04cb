/// Schema for the record store and the offline asset cache.
pub const SCHEMA: &str = r#"
-- Per-collection records (rows, meta, comments), stored as JSON
CREATE TABLE IF NOT EXISTS kv_store (
    collection TEXT NOT NULL,
    record_key TEXT NOT NULL,
    data BLOB NOT NULL,
    stored_at TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (collection, record_key)
);

-- Versioned offline asset cache
CREATE TABLE IF NOT EXISTS asset_cache (
    cache_name TEXT NOT NULL,
    url_hash TEXT NOT NULL,
    url TEXT NOT NULL,
    content_type TEXT,
    body BLOB NOT NULL,
    cached_at TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (cache_name, url_hash)
);

CREATE INDEX IF NOT EXISTS idx_asset_cache_name ON asset_cache(cache_name);
"#;
