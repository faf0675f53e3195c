//! In-process key-value store.

use std::cell::RefCell;
use std::collections::BTreeMap;

use super::KeyValueStore;
use crate::error::Result;

/// A [`KeyValueStore`] that lives only as long as the process.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: RefCell<BTreeMap<String, String>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl KeyValueStore for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool> {
        Ok(self.entries.borrow_mut().remove(key).is_some())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.entries.borrow().keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_store() {
        let store = MemoryStorage::new();
        assert!(store.is_empty());
        assert_eq!(store.get("birthRecords").unwrap(), None);
    }

    #[test]
    fn test_set_get_remove() {
        let store = MemoryStorage::new();
        store.set("deathRecords", "[]").unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("deathRecords").unwrap().as_deref(), Some("[]"));

        assert!(store.remove("deathRecords").unwrap());
        assert!(!store.remove("deathRecords").unwrap());
        assert!(store.is_empty());
    }

    #[test]
    fn test_keys_sorted() {
        let store = MemoryStorage::new();
        store.set("selectedSetting", "system").unwrap();
        store.set("birthRecords", "[]").unwrap();
        assert_eq!(store.keys().unwrap(), vec!["birthRecords", "selectedSetting"]);
    }
}
