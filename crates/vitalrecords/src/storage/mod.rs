//! Persistence for the record collections.
//!
//! The registry only ever needs a string-keyed store of string values, so
//! that is the seam: [`KeyValueStore`]. [`Storage`] puts it in a `SQLite`
//! file; [`MemoryStorage`] keeps it in the process.

mod memory;
pub mod migrations;
pub mod schema;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use crate::error::{Error, Result};

pub use memory::MemoryStorage;

const IN_MEMORY: &str = ":memory:";

/// A string-keyed store of string values.
///
/// `set` replaces the whole value under a key; there is no merge.
pub trait KeyValueStore {
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Delete `key`, returning whether it was present.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn remove(&self, key: &str) -> Result<bool>;

    /// Present keys in ascending order.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn keys(&self) -> Result<Vec<String>>;
}

/// Key-value store in a `SQLite` database.
#[derive(Debug)]
pub struct Storage {
    path: PathBuf,
    conn: Connection,
}

impl Storage {
    /// Open the record store at `path`, creating the file and any missing
    /// parent directories, and upgrade its schema.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or database cannot be created, or
    /// the schema cannot be upgraded.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() && !dir.exists() => {
                std::fs::create_dir_all(dir).map_err(|source| Error::DirectoryCreate {
                    path: dir.to_path_buf(),
                    source,
                })?;
                debug!("Created {}", dir.display());
            }
            _ => {}
        }

        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;
        let journal: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        debug!("Journal mode {}", journal);
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        migrations::initialize_schema(&conn)?;

        info!("Record store ready at {}", path.display());
        Ok(Self { path, conn })
    }

    /// A throwaway store with the full schema.
    ///
    /// # Errors
    ///
    /// Returns an error if `SQLite` cannot allocate the database.
    pub fn open_in_memory() -> Result<Self> {
        let path = PathBuf::from(IN_MEMORY);
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;
        migrations::initialize_schema(&conn)?;
        Ok(Self { path, conn })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn is_in_memory(&self) -> bool {
        self.path.as_os_str() == IN_MEMORY
    }

    /// Number of keys present.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn count(&self) -> Result<i64> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM entries", [], |row| row.get(0))?)
    }

    /// Entry count, last write time and file size.
    ///
    /// # Errors
    ///
    /// Returns an error if the queries fail.
    pub fn stats(&self) -> Result<StorageStats> {
        let last_write: Option<String> = self
            .conn
            .query_row("SELECT MAX(updated_at) FROM entries", [], |row| row.get(0))?;

        let db_size_bytes = if self.is_in_memory() {
            0
        } else {
            std::fs::metadata(&self.path).map_or(0, |meta| meta.len())
        };

        Ok(StorageStats {
            total_entries: self.count()?,
            last_write: last_write
                .as_deref()
                .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
                .map(|at| at.with_timezone(&Utc)),
            db_size_bytes,
        })
    }
}

impl KeyValueStore for Storage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let value: Option<String> = self
            .conn
            .query_row("SELECT value FROM entries WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?;
        debug!("Read '{}' ({})", key, if value.is_some() { "present" } else { "absent" });
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO entries (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, Utc::now().to_rfc3339()],
        )?;
        debug!("Wrote {} bytes under '{}'", value.len(), key);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool> {
        let deleted = self.conn.execute("DELETE FROM entries WHERE key = ?1", [key])?;
        Ok(deleted > 0)
    }

    fn keys(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare("SELECT key FROM entries ORDER BY key")?;
        let keys = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(keys)
    }
}

/// A summary of the record store, shown by `vitrec stats`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageStats {
    pub total_entries: i64,
    pub last_write: Option<DateTime<Utc>>,
    /// Zero for an in-memory store.
    pub db_size_bytes: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_store() -> Storage {
        Storage::open_in_memory().unwrap()
    }

    fn scratch_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("vitalrecords_{}_{}", std::process::id(), name))
    }

    fn remove_db_files(db: &Path) {
        for suffix in ["", "-wal", "-shm"] {
            let mut file = db.as_os_str().to_owned();
            file.push(suffix);
            let _ = std::fs::remove_file(PathBuf::from(file));
        }
    }

    #[test]
    fn test_missing_key_reads_none() {
        assert_eq!(memory_store().get("birthRecords").unwrap(), None);
    }

    #[test]
    fn test_set_replaces_whole_value() {
        let store = memory_store();
        store.set("selectedSetting", "dashboard").unwrap();
        store.set("selectedSetting", "system").unwrap();

        assert_eq!(store.get("selectedSetting").unwrap().as_deref(), Some("system"));
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn test_remove_reports_presence() {
        let store = memory_store();
        store.set("deathRecords", "[]").unwrap();

        assert!(store.remove("deathRecords").unwrap());
        assert!(!store.remove("deathRecords").unwrap());
        assert_eq!(store.get("deathRecords").unwrap(), None);
    }

    #[test]
    fn test_keys_are_sorted() {
        let store = memory_store();
        for key in ["selectedSetting", "deathRecords", "birthRecords"] {
            store.set(key, "x").unwrap();
        }
        assert_eq!(
            store.keys().unwrap(),
            vec!["birthRecords", "deathRecords", "selectedSetting"]
        );
    }

    #[test]
    fn test_non_ascii_values_survive() {
        let store = memory_store();
        let value = r#"[{"id":1,"firstName":"Zoë","lastName":"Ngữ"}]"#;
        store.set("birthRecords", value).unwrap();
        assert_eq!(store.get("birthRecords").unwrap().as_deref(), Some(value));
    }

    #[test]
    fn test_stats() {
        let store = memory_store();
        let empty = store.stats().unwrap();
        assert_eq!(empty.total_entries, 0);
        assert!(empty.last_write.is_none());
        assert_eq!(empty.db_size_bytes, 0);

        store.set("birthRecords", "[]").unwrap();
        store.set("deathRecords", "[]").unwrap();
        let stats = store.stats().unwrap();
        assert_eq!(stats.total_entries, 2);
        assert!(stats.last_write.is_some());
        assert_eq!(store.path(), Path::new(":memory:"));
    }

    #[test]
    fn test_file_store_persists_across_reopen() {
        let db = scratch_path("persist.db");
        remove_db_files(&db);

        {
            let store = Storage::open(&db).unwrap();
            store.set("birthRecords", r#"[{"id":1}]"#).unwrap();
            assert_eq!(store.path(), db);
        }

        let reopened = Storage::open(&db).unwrap();
        assert_eq!(
            reopened.get("birthRecords").unwrap().as_deref(),
            Some(r#"[{"id":1}]"#)
        );
        assert!(reopened.stats().unwrap().db_size_bytes > 0);

        drop(reopened);
        remove_db_files(&db);
    }

    #[test]
    fn test_open_creates_missing_directories() {
        let root = scratch_path("tree");
        let _ = std::fs::remove_dir_all(&root);
        let db = root.join("a").join("b").join("records.db");

        let store = Storage::open(&db).unwrap();
        assert!(db.exists());

        drop(store);
        let _ = std::fs::remove_dir_all(&root);
    }
}
