//! Record store access and profile mutation.
//!
//! [`Registry`] is the single access point to the persisted collections.
//! Every component reads through it, and every write it performs is
//! announced to subscribers so they can re-read instead of drifting out of
//! sync.
//!
//! Mutations are read-modify-write over a whole collection with no locking:
//! two writers racing on the same collection lose one of the updates.

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::record::{Origin, Profile, Record, RecordId};
use crate::storage::KeyValueStore;
use crate::views;

/// Key holding the last settings-menu choice.
pub const SELECTED_SETTING_KEY: &str = "selectedSetting";

/// What a [`ChangeEvent`] is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeScope {
    /// One of the record collections.
    Collection(Origin),
    /// The selected setting.
    Setting,
}

/// What happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeKind {
    /// The whole value was overwritten.
    Saved,
    /// A record was appended.
    Registered(RecordId),
    /// A record was edited in place.
    Updated(RecordId),
    /// A record was deleted.
    Removed(RecordId),
    /// A batch of records was appended.
    Imported(usize),
}

/// Notification delivered to subscribers after a successful write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub scope: ChangeScope,
    pub kind: ChangeKind,
}

/// Handle returned by [`Registry::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn Fn(&ChangeEvent)>;

/// Both collections as read at one moment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub birth: Vec<Record>,
    pub death: Vec<Record>,
}

impl Snapshot {
    /// The collection for `origin`.
    #[must_use]
    pub fn collection(&self, origin: Origin) -> &[Record] {
        match origin {
            Origin::Birth => &self.birth,
            Origin::Death => &self.death,
        }
    }

    #[must_use]
    pub fn profiles(&self) -> Vec<Profile> {
        views::all_profiles(&self.birth, &self.death)
    }

    /// Find a profile by origin and identifier.
    #[must_use]
    pub fn find(&self, origin: Origin, id: &RecordId) -> Option<&Record> {
        self.collection(origin).iter().find(|r| r.id() == id)
    }
}

/// Access to the birth and death collections in a key-value store.
pub struct Registry<S> {
    store: S,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl<S: fmt::Debug> fmt::Debug for Registry<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("store", &self.store)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl<S: KeyValueStore> Registry<S> {
    #[must_use]
    pub fn new(store: S) -> Self {
        Self {
            store,
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    /// The underlying store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Register a listener called after every successful write.
    pub fn subscribe(&mut self, listener: impl Fn(&ChangeEvent) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a listener. Returns `false` if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    fn notify(&self, scope: ChangeScope, kind: ChangeKind) {
        let event = ChangeEvent { scope, kind };
        for (_, listener) in &self.listeners {
            listener(&event);
        }
    }

    /// Load one collection.
    ///
    /// An absent key, blank value or content that is not a JSON array all
    /// read as an empty collection. Elements of the array that are not
    /// records are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns an error only if the store itself cannot be read.
    pub fn load_collection(&self, origin: Origin) -> Result<Vec<Record>> {
        match self.read_entries(origin) {
            Ok(entries) => {
                let records: Vec<Record> =
                    entries.into_iter().filter_map(Entry::into_record).collect();
                debug!("Loaded {} {} records", records.len(), origin);
                Ok(records)
            }
            Err(e) if e.is_unreadable() => {
                warn!("Ignoring malformed '{}' content: {}", origin.storage_key(), e);
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }

    /// Read a collection for rewriting.
    ///
    /// Fails with [`Error::UnreadableCollection`] when the stored text is
    /// not a JSON array, so a mutation never replaces content it could not
    /// read.
    fn read_entries(&self, origin: Origin) -> Result<Vec<Entry>> {
        let key = origin.storage_key();
        let Some(raw) = self.store.get(key)? else {
            return Ok(Vec::new());
        };
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }

        let values: Vec<Value> =
            serde_json::from_str(&raw).map_err(|e| Error::UnreadableCollection {
                origin,
                message: e.to_string(),
            })?;

        let entries = values
            .into_iter()
            .enumerate()
            .map(|(index, value)| match Record::from_value(origin, value.clone()) {
                Ok(record) => Entry::Record(record),
                Err(e) => {
                    warn!("Skipping '{}' element {}: {}", key, index, e);
                    Entry::Unreadable(value)
                }
            })
            .collect();
        Ok(entries)
    }

    fn write_entries(&self, origin: Origin, entries: &[Entry]) -> Result<()> {
        let json = serde_json::to_string(entries)?;
        self.store.set(origin.storage_key(), &json)?;
        debug!("Saved {} {} entries", entries.len(), origin);
        Ok(())
    }

    /// Overwrite one collection.
    ///
    /// # Errors
    ///
    /// Returns an error if a record belongs to the other collection, or the
    /// store cannot be written.
    pub fn save_collection(&self, origin: Origin, records: &[Record]) -> Result<()> {
        check_origin(origin, records)?;
        let json = serde_json::to_string(records)?;
        self.store.set(origin.storage_key(), &json)?;
        debug!("Saved {} {} records", records.len(), origin);
        self.notify(ChangeScope::Collection(origin), ChangeKind::Saved);
        Ok(())
    }

    /// Load both collections.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn snapshot(&self) -> Result<Snapshot> {
        Ok(Snapshot {
            birth: self.load_collection(Origin::Birth)?,
            death: self.load_collection(Origin::Death)?,
        })
    }

    /// Append a new record to its collection.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateRecord`] if the identifier is already used in
    /// that collection, [`Error::UnreadableCollection`] if the stored
    /// collection is not a JSON array, or an error if the store fails.
    pub fn register(&self, record: Record) -> Result<()> {
        let origin = record.origin();
        let mut entries = self.read_entries(origin)?;
        if entries.iter().any(|e| e.has_id(record.id())) {
            return Err(Error::duplicate(origin, record.id()));
        }

        let id = record.id().clone();
        entries.push(Entry::Record(record));
        self.write_entries(origin, &entries)?;
        info!("Registered {} record {}", origin, id);
        self.notify(ChangeScope::Collection(origin), ChangeKind::Registered(id));
        Ok(())
    }

    /// Edit a record in place and return the updated version.
    ///
    /// `patch` holds stored (camelCase) field names and is merged over the
    /// existing record.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RecordNotFound`] if no record has `id`,
    /// [`Error::InvalidPatch`] if the patch cannot be applied, or an error if
    /// the store fails. The collection is unchanged on error.
    pub fn update_profile(
        &self,
        origin: Origin,
        id: &RecordId,
        patch: &Map<String, Value>,
    ) -> Result<Record> {
        let mut entries = self.read_entries(origin)?;
        let slot = entries
            .iter_mut()
            .find_map(|e| match e {
                Entry::Record(r) if r.id() == id => Some(r),
                _ => None,
            })
            .ok_or_else(|| Error::not_found(origin, id))?;

        let updated = slot.patched(patch)?;
        *slot = updated.clone();

        self.write_entries(origin, &entries)?;
        info!("Updated {} record {}", origin, id);
        self.notify(
            ChangeScope::Collection(origin),
            ChangeKind::Updated(id.clone()),
        );
        Ok(updated)
    }

    /// Delete a record permanently and return it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RecordNotFound`] if no record has `id` (the collection
    /// is left untouched), [`Error::UnreadableCollection`] if the stored
    /// collection is not a JSON array, or an error if the store fails.
    pub fn remove_profile(&self, origin: Origin, id: &RecordId) -> Result<Record> {
        let mut entries = self.read_entries(origin)?;
        let index = entries
            .iter()
            .position(|e| e.has_id(id))
            .ok_or_else(|| Error::not_found(origin, id))?;

        let Entry::Record(removed) = entries.remove(index) else {
            return Err(Error::internal("matched entry is not a record"));
        };
        self.write_entries(origin, &entries)?;
        info!("Removed {} record {}", origin, id);
        self.notify(
            ChangeScope::Collection(origin),
            ChangeKind::Removed(id.clone()),
        );
        Ok(removed)
    }

    /// Append a batch of records in one write and return how many were added.
    ///
    /// Nothing is written unless every record belongs to `origin` and every
    /// identifier is new, both to the collection and within the batch.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateRecord`] naming the first colliding
    /// identifier, [`Error::UnreadableCollection`] if the stored collection is
    /// not a JSON array, or an error if the store fails.
    pub fn import(&self, origin: Origin, records: Vec<Record>) -> Result<usize> {
        check_origin(origin, &records)?;
        let mut entries = self.read_entries(origin)?;

        let mut taken: HashSet<String> = entries
            .iter()
            .filter_map(|e| match e {
                Entry::Record(r) => Some(r.id().to_string()),
                Entry::Unreadable(_) => None,
            })
            .collect();
        if let Some(dup) = records.iter().find(|r| !taken.insert(r.id().to_string())) {
            return Err(Error::duplicate(origin, dup.id()));
        }

        let count = records.len();
        entries.extend(records.into_iter().map(Entry::Record));
        self.write_entries(origin, &entries)?;
        info!("Imported {} {} records", count, origin);
        self.notify(ChangeScope::Collection(origin), ChangeKind::Imported(count));
        Ok(count)
    }

    /// Discharge a birth record.
    ///
    /// # Errors
    ///
    /// See [`Registry::remove_profile`].
    pub fn discharge(&self, id: &RecordId) -> Result<Record> {
        self.remove_profile(Origin::Birth, id)
    }

    /// Remove a death record.
    ///
    /// # Errors
    ///
    /// See [`Registry::remove_profile`].
    pub fn remove(&self, id: &RecordId) -> Result<Record> {
        self.remove_profile(Origin::Death, id)
    }

    /// Remember the last settings-menu choice.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    pub fn select_setting(&self, setting: &str) -> Result<()> {
        self.store.set(SELECTED_SETTING_KEY, setting)?;
        debug!("Selected setting '{}'", setting);
        self.notify(ChangeScope::Setting, ChangeKind::Saved);
        Ok(())
    }

    /// The last settings-menu choice, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn selected_setting(&self) -> Result<Option<String>> {
        self.store.get(SELECTED_SETTING_KEY)
    }
}

/// One element of a stored collection.
///
/// Elements that do not decode as records are carried through writes
/// unchanged.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Entry {
    Record(Record),
    Unreadable(Value),
}

impl Entry {
    fn into_record(self) -> Option<Record> {
        match self {
            Self::Record(record) => Some(record),
            Self::Unreadable(_) => None,
        }
    }

    fn has_id(&self, id: &RecordId) -> bool {
        matches!(self, Self::Record(r) if r.id() == id)
    }
}

fn check_origin(origin: Origin, records: &[Record]) -> Result<()> {
    match records.iter().find(|r| r.origin() != origin) {
        Some(stray) => Err(Error::internal(format!(
            "{} record {} cannot be saved into the {} collection",
            stray.origin(),
            stray.id(),
            origin
        ))),
        None => Ok(()),
    }
}

/// Parse a whole collection strictly, as an import file.
///
/// # Errors
///
/// Returns an error if `raw` is not a JSON array of records of `origin`.
pub fn parse_collection(origin: Origin, raw: &str) -> Result<Vec<Record>> {
    let values: Vec<Value> = serde_json::from_str(raw)?;
    values
        .into_iter()
        .map(|value| Record::from_value(origin, value))
        .collect()
}
