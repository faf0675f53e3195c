//! `SQLite` schema for the record store.
//!
//! Each persisted key is one row of `entries`; the value is the JSON text of
//! a whole collection, or a plain string for the selected setting.

/// Bookkeeping table; holds `schema_version`.
pub const METADATA_TABLE: &str = "
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
";

/// Version 1: the key-value table.
pub const ENTRIES_TABLE: &str = "
CREATE TABLE IF NOT EXISTS entries (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
";

/// Version 2: index backing the last-write lookup in storage stats.
pub const ENTRIES_UPDATED_INDEX: &str = "
CREATE INDEX IF NOT EXISTS idx_entries_updated ON entries(updated_at DESC);
";
