use crate::domain::DateRange;
use crate::entities::{Entry, EntryDraft, EntryId, EntryPatch};
use crate::error::JournalResult;
use crate::infrastructure::StorageAdapter;
use chrono::NaiveDate;
use log::{debug, warn};

/// In-memory cache of journal entries, kept in step with the store.
///
/// Every mutation goes to the store first; the cache changes only after the
/// store call succeeds.
#[derive(Debug, Default)]
pub struct EntryRepository {
    entries: Vec<Entry>,
}

impl EntryRepository {
    pub fn new(entries: Vec<Entry>) -> Self {
        Self { entries }
    }

    pub fn list(&self) -> &[Entry] {
        &self.entries
    }

    pub fn get(&self, id: &EntryId) -> Option<&Entry> {
        self.entries.iter().find(|entry| &entry.id == id)
    }

    pub fn entries_on_date(&self, date: NaiveDate) -> Vec<&Entry> {
        self.entries
            .iter()
            .filter(|entry| entry.date == date)
            .collect()
    }

    pub fn entries_in_range(&self, range: &DateRange) -> Vec<&Entry> {
        self.entries
            .iter()
            .filter(|entry| range.contains(entry.date))
            .collect()
    }

    pub fn create(&mut self, storage: &dyn StorageAdapter, draft: EntryDraft) -> JournalResult<Entry> {
        draft.validate()?;

        let id = storage.create_entry(&draft)?;
        let entry = Entry::from_draft(id, draft);
        debug!("created entry {} on {}", entry.id, entry.date);

        self.entries.push(entry.clone());
        Ok(entry)
    }

    /// Returns the merged entry, or `None` when `id` is unknown.
    pub fn update(
        &mut self,
        storage: &dyn StorageAdapter,
        id: &EntryId,
        patch: &EntryPatch,
    ) -> JournalResult<Option<Entry>> {
        let Some(index) = self.position(id) else {
            debug!("update of unknown entry {id} ignored");
            return Ok(None);
        };

        let mut merged = self.entries[index].clone();
        patch.apply(&mut merged);
        merged.validate()?;

        if !storage.update_entry(id, patch)? {
            warn!("entry {id} vanished from the store; dropping it from the cache");
            self.entries.remove(index);
            return Ok(None);
        }

        debug!("updated entry {id}");
        self.entries[index] = merged.clone();
        Ok(Some(merged))
    }

    /// Returns whether an entry was removed.
    pub fn delete(&mut self, storage: &dyn StorageAdapter, id: &EntryId) -> JournalResult<bool> {
        let Some(index) = self.position(id) else {
            debug!("delete of unknown entry {id} ignored");
            return Ok(false);
        };

        if !storage.delete_entry(id)? {
            warn!("entry {id} was already gone from the store");
        }

        debug!("deleted entry {id}");
        self.entries.remove(index);
        Ok(true)
    }

    fn position(&self, id: &EntryId) -> Option<usize> {
        self.entries.iter().position(|entry| &entry.id == id)
    }
}
