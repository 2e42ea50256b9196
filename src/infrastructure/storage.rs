use crate::entities::{Category, EntryDraft, EntryId, EntryPatch, Snapshot};
use crate::error::{JournalError, JournalResult};

/// Durable home of entries and reference lists.
///
/// Every mutation must be persisted before it returns `Ok`. Callers update
/// their caches only after that, so a failed call leaves them untouched.
pub trait StorageAdapter {
    /// Load the full working set: entries, people, sites and species.
    fn load(&self) -> JournalResult<Snapshot>;

    /// Persist a new entry and return the id the store assigned to it.
    fn create_entry(&self, draft: &EntryDraft) -> JournalResult<EntryId>;

    /// Merge `patch` into the stored entry. Returns `false` when no entry has `id`.
    fn update_entry(&self, id: &EntryId, patch: &EntryPatch) -> JournalResult<bool>;

    /// Returns `false` when no entry has `id`.
    fn delete_entry(&self, id: &EntryId) -> JournalResult<bool>;

    /// Insert `name` into a reference list and return its id.
    ///
    /// A name that is already present yields the existing id.
    fn create_reference(&self, category: Category, name: &str) -> JournalResult<String>;

    /// Remove the item whose id or name equals `id_or_name`.
    fn delete_reference(&self, category: Category, id_or_name: &str) -> JournalResult<bool>;

    /// Get storage backend information
    fn backend_info(&self) -> &str;
}

/// Stands in for a store that could not be opened. Every call fails with
/// `StoreUnavailable`, so a session can still start on an empty working set.
pub struct OfflineStorage {
    label: String,
    reason: String,
}

impl OfflineStorage {
    pub fn new(backend: &str, reason: impl Into<String>) -> Self {
        Self {
            label: format!("{backend} (offline)"),
            reason: reason.into(),
        }
    }

    fn unavailable<T>(&self) -> JournalResult<T> {
        Err(JournalError::unavailable(format!(
            "{} could not be opened: {}",
            self.label, self.reason
        )))
    }
}

impl StorageAdapter for OfflineStorage {
    fn load(&self) -> JournalResult<Snapshot> {
        self.unavailable()
    }

    fn create_entry(&self, _draft: &EntryDraft) -> JournalResult<EntryId> {
        self.unavailable()
    }

    fn update_entry(&self, _id: &EntryId, _patch: &EntryPatch) -> JournalResult<bool> {
        self.unavailable()
    }

    fn delete_entry(&self, _id: &EntryId) -> JournalResult<bool> {
        self.unavailable()
    }

    fn create_reference(&self, _category: Category, _name: &str) -> JournalResult<String> {
        self.unavailable()
    }

    fn delete_reference(&self, _category: Category, _id_or_name: &str) -> JournalResult<bool> {
        self.unavailable()
    }

    fn backend_info(&self) -> &str {
        &self.label
    }
}
