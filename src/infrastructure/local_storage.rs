use crate::entities::{Category, Entry, EntryDraft, EntryId, EntryPatch, ReferenceItem, Snapshot};
use crate::error::{JournalError, JournalResult, StoreContext};
use crate::infrastructure::storage::StorageAdapter;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tempfile::NamedTempFile;
use uuid::Uuid;

/// Well-known key the whole journal is stored under.
pub const STORAGE_KEY: &str = "wawata-data";

pub const DEFAULT_SITES: &[&str] = &["River Bank", "Forest Edge", "Wetland", "Home Paddock"];
pub const DEFAULT_SPECIES: &[&str] = &[
    "Old Man's Beard",
    "Banana Passionfruit",
    "Woolly Nightshade",
    "Gorse",
    "Blackberry",
];
pub const DEFAULT_PEOPLE: &[&str] = &["Kaitiaki 1", "Volunteer A", "Volunteer B"];

/// On-disk shape of the blob. Reference lists are bare names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct StoredBlob {
    #[serde(default)]
    entries: Vec<Entry>,
    #[serde(default)]
    sites: Vec<String>,
    #[serde(default)]
    species: Vec<String>,
    #[serde(default)]
    people: Vec<String>,
}

impl StoredBlob {
    fn seeded() -> Self {
        let owned = |names: &[&str]| -> Vec<String> {
            names.iter().map(|name| name.to_string()).collect()
        };
        Self {
            entries: Vec::new(),
            sites: owned(DEFAULT_SITES),
            species: owned(DEFAULT_SPECIES),
            people: owned(DEFAULT_PEOPLE),
        }
    }

    fn names_mut(&mut self, category: Category) -> &mut Vec<String> {
        match category {
            Category::People => &mut self.people,
            Category::Sites => &mut self.sites,
            Category::Species => &mut self.species,
        }
    }

    /// Entries that fail validation stay in the blob but are left out of the
    /// snapshot.
    fn to_snapshot(&self) -> Snapshot {
        let items = |names: &[String]| -> Vec<ReferenceItem> {
            names.iter().map(|name| ReferenceItem::named(name.as_str())).collect()
        };
        let entries = self
            .entries
            .iter()
            .filter(|entry| match entry.validate() {
                Ok(()) => true,
                Err(err) => {
                    warn!("skipping stored entry {}: {err}", entry.id);
                    false
                }
            })
            .cloned()
            .collect();

        Snapshot {
            entries,
            people: items(self.people.as_slice()),
            sites: items(self.sites.as_slice()),
            species: items(self.species.as_slice()),
        }
    }
}

/// Local persisted fallback: the whole journal as one JSON blob.
///
/// Nothing is read until the first `load` or mutation, so opening never fails
/// on an unreadable blob. Every mutation rewrites the blob atomically before
/// the in-memory copy is replaced.
pub struct LocalStorage {
    dir: PathBuf,
    path: PathBuf,
    seed_defaults: bool,
    /// `None` until the blob has been read from disk successfully.
    blob: Mutex<Option<StoredBlob>>,
}

impl LocalStorage {
    pub fn open<P: AsRef<Path>>(dir: P, seed_defaults: bool) -> JournalResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)
            .with_store_context(|| format!("Failed to create data directory {}", dir.display()))?;

        let path = dir.join(format!("{STORAGE_KEY}.json"));
        info!("opened local store at {}", path.display());
        Ok(Self {
            dir,
            path,
            seed_defaults,
            blob: Mutex::new(None),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn blob(&self) -> JournalResult<MutexGuard<'_, Option<StoredBlob>>> {
        self.blob
            .lock()
            .map_err(|_| JournalError::unavailable("local store lock poisoned"))
    }

    /// Reads the blob, initializing it when nothing has been stored yet.
    fn read_blob(&self) -> JournalResult<StoredBlob> {
        if !self.path.exists() {
            let initial = if self.seed_defaults {
                StoredBlob::seeded()
            } else {
                StoredBlob::default()
            };
            self.write_blob(&initial)?;
            info!("initialized {} (seeded: {})", STORAGE_KEY, self.seed_defaults);
            return Ok(initial);
        }

        let content = fs::read_to_string(&self.path)
            .with_store_context(|| format!("Failed to read {}", self.path.display()))?;
        serde_json::from_str(&content)
            .with_store_context(|| format!("Stored data in {} is unreadable", self.path.display()))
    }

    fn write_blob(&self, blob: &StoredBlob) -> JournalResult<()> {
        let content =
            serde_json::to_string_pretty(blob).store_context("Failed to serialize journal data")?;

        let mut file = NamedTempFile::new_in(&self.dir).store_context("Failed to create temp file")?;
        file.write_all(content.as_bytes())
            .store_context("Failed to write journal data")?;
        file.persist(&self.path)
            .map_err(|e| e.error)
            .with_store_context(|| format!("Failed to replace {}", self.path.display()))?;

        Ok(())
    }

    /// Applies `change` to a copy of the blob and swaps it in once persisted.
    /// The closure reports whether it changed anything; unchanged blobs are
    /// not rewritten.
    ///
    /// The copy always comes from a blob read off disk. If no read has
    /// succeeded yet, one is attempted first and its failure aborts the
    /// mutation, so an unreadable blob is never overwritten.
    fn mutate<T, F>(&self, change: F) -> JournalResult<T>
    where
        F: FnOnce(&mut StoredBlob) -> (T, bool),
    {
        let mut current = self.blob()?;
        let mut next = match current.as_ref() {
            Some(blob) => blob.clone(),
            None => self.read_blob()?,
        };
        let (result, changed) = change(&mut next);

        if changed {
            self.write_blob(&next)?;
        }
        *current = Some(next);

        Ok(result)
    }
}

impl StorageAdapter for LocalStorage {
    fn load(&self) -> JournalResult<Snapshot> {
        let blob = self.read_blob()?;
        let snapshot = blob.to_snapshot();
        *self.blob()? = Some(blob);
        Ok(snapshot)
    }

    fn create_entry(&self, draft: &EntryDraft) -> JournalResult<EntryId> {
        let id = EntryId::new(Uuid::new_v4().to_string());
        let entry = Entry::from_draft(id.clone(), draft.clone());

        self.mutate(|blob| {
            blob.entries.push(entry);
            ((), true)
        })?;

        debug!("stored entry {id}");
        Ok(id)
    }

    fn update_entry(&self, id: &EntryId, patch: &EntryPatch) -> JournalResult<bool> {
        self.mutate(|blob| match blob.entries.iter_mut().find(|entry| &entry.id == id) {
            Some(entry) => {
                patch.apply(entry);
                (true, true)
            }
            None => (false, false),
        })
    }

    fn delete_entry(&self, id: &EntryId) -> JournalResult<bool> {
        self.mutate(|blob| {
            let before = blob.entries.len();
            blob.entries.retain(|entry| &entry.id != id);
            let deleted = blob.entries.len() != before;
            (deleted, deleted)
        })
    }

    fn create_reference(&self, category: Category, name: &str) -> JournalResult<String> {
        self.mutate(|blob| {
            let names = blob.names_mut(category);
            if names.iter().any(|existing| existing == name) {
                return (name.to_string(), false);
            }
            names.push(name.to_string());
            (name.to_string(), true)
        })
    }

    fn delete_reference(&self, category: Category, id_or_name: &str) -> JournalResult<bool> {
        self.mutate(|blob| {
            let names = blob.names_mut(category);
            let before = names.len();
            names.retain(|name| name != id_or_name);
            let deleted = names.len() != before;
            (deleted, deleted)
        })
    }

    fn backend_info(&self) -> &str {
        "Local JSON Storage Backend v1.0"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::test_utils::test_harness::TestLocalStorage;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_first_open_seeds_default_lists() {
        let test_storage = TestLocalStorage::seeded();
        let snapshot = test_storage.storage().load().unwrap();

        assert!(snapshot.entries.is_empty());
        assert_eq!(snapshot.sites.len(), DEFAULT_SITES.len());
        assert_eq!(snapshot.species[3], ReferenceItem::named("Gorse"));
        assert_eq!(snapshot.people[0].name, "Kaitiaki 1");
        assert!(test_storage.storage().path().exists());
    }

    #[test]
    fn test_unseeded_store_starts_empty() {
        let test_storage = TestLocalStorage::new();
        assert_eq!(test_storage.storage().load().unwrap(), Snapshot::default());
    }

    #[test]
    fn test_blob_layout_uses_storage_key_and_iso_dates() {
        let test_storage = TestLocalStorage::new();
        let storage = test_storage.storage();
        storage
            .create_entry(&EntryDraft::new(date(2024, 1, 1), "A", "Wetland", "Gorse", 1.5))
            .unwrap();
        storage.create_reference(Category::Sites, "Wetland").unwrap();

        let path = test_storage.dir().join("wawata-data.json");
        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();

        assert_eq!(raw["entries"][0]["date"], "2024-01-01");
        assert_eq!(raw["entries"][0]["speciesName"], "Gorse");
        assert_eq!(raw["sites"][0], "Wetland");
    }

    #[test]
    fn test_data_survives_reopen() {
        let test_storage = TestLocalStorage::new();
        let id = test_storage
            .storage()
            .create_entry(&EntryDraft::new(date(2024, 1, 2), "A", "Wetland", "Gorse", 3.0))
            .unwrap();

        let reopened = LocalStorage::open(test_storage.dir(), true).unwrap();
        let snapshot = reopened.load().unwrap();
        assert_eq!(snapshot.entries.len(), 1);
        assert_eq!(snapshot.entries[0].id, id);
        // an existing blob is never reseeded
        assert!(snapshot.sites.is_empty());
    }

    #[test]
    fn test_legacy_blob_is_revived() {
        let test_storage = TestLocalStorage::new();
        let legacy = r#"{
            "entries": [{
                "id": "1",
                "date": "2024-02-10T03:15:00.000Z",
                "name": "Kaitiaki 1",
                "targetSpecies": "Old Man's Beard",
                "site": "River Bank",
                "hours": 2.5
            }],
            "sites": ["River Bank"],
            "people": ["Kaitiaki 1"]
        }"#;
        fs::write(test_storage.dir().join("wawata-data.json"), legacy).unwrap();

        let snapshot = test_storage.storage().load().unwrap();
        assert_eq!(
            Some(snapshot.entries[0].date),
            crate::entities::iso_date::parse("2024-02-10T03:15:00.000Z")
        );
        assert_eq!(snapshot.entries[0].site_name, "River Bank");
        assert!(snapshot.species.is_empty());
    }

    #[test]
    fn test_corrupt_blob_is_store_unavailable() {
        let test_storage = TestLocalStorage::new();
        fs::write(test_storage.dir().join("wawata-data.json"), "{ not json").unwrap();

        let err = test_storage.storage().load().unwrap_err();
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_corrupt_blob_is_never_overwritten() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("wawata-data.json");
        fs::write(&path, "{ not json").unwrap();

        let storage = LocalStorage::open(temp_dir.path(), true).unwrap();
        assert!(storage.load().is_err());

        let draft = EntryDraft::new(date(2024, 1, 1), "A", "Wetland", "Gorse", 1.0);
        assert!(storage.create_entry(&draft).unwrap_err().is_recoverable());
        assert!(storage.create_reference(Category::Sites, "Wetland").is_err());
        assert_eq!(fs::read_to_string(&path).unwrap(), "{ not json");

        // once the blob is repaired the same handle works again
        fs::write(&path, r#"{"sites": ["River Bank"]}"#).unwrap();
        storage.create_reference(Category::Sites, "Wetland").unwrap();
        assert_eq!(storage.load().unwrap().sites.len(), 2);
    }

    #[test]
    fn test_invalid_stored_entries_are_skipped_but_kept_on_disk() {
        let test_storage = TestLocalStorage::new();
        let path = test_storage.dir().join("wawata-data.json");
        let blob = r#"{
            "entries": [
                {"id": "bad", "date": "2024-01-01", "personName": "A", "siteName": "Wetland",
                 "speciesName": "Gorse", "hours": -2},
                {"id": "good", "date": "2024-01-01", "personName": "A", "siteName": "Wetland",
                 "speciesName": "Gorse", "hours": 1.5}
            ]
        }"#;
        fs::write(&path, blob).unwrap();

        let snapshot = test_storage.storage().load().unwrap();
        assert_eq!(snapshot.entries.len(), 1);
        assert_eq!(snapshot.entries[0].id, EntryId::new("good"));

        test_storage
            .storage()
            .create_entry(&EntryDraft::new(date(2024, 1, 2), "A", "Wetland", "Gorse", 1.0))
            .unwrap();
        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["entries"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_update_and_delete_unknown_ids_are_no_ops() {
        let test_storage = TestLocalStorage::new();
        let storage = test_storage.storage();
        let missing = EntryId::new("missing");

        assert!(!storage.update_entry(&missing, &EntryPatch::new().hours(1.0)).unwrap());
        assert!(!storage.delete_entry(&missing).unwrap());
        assert!(!storage.delete_reference(Category::People, "Nobody").unwrap());
    }

    #[test]
    fn test_duplicate_reference_is_not_stored_twice() {
        let test_storage = TestLocalStorage::new();
        let storage = test_storage.storage();

        assert_eq!(storage.create_reference(Category::Species, "Gorse").unwrap(), "Gorse");
        assert_eq!(storage.create_reference(Category::Species, "Gorse").unwrap(), "Gorse");
        assert_eq!(storage.load().unwrap().species.len(), 1);
    }
}
