use crate::domain::{
    DateRange, EntryRepository, GroupBy, HoursTotal, Period, ReferenceLists, Report, aggregation,
};
use crate::entities::{Category, Entry, EntryDraft, EntryId, EntryPatch, ReferenceItem};
use crate::error::JournalResult;
use crate::infrastructure::StorageAdapter;
use chrono::NaiveDate;
use log::{info, warn};

/// One user session: the storage adapter plus the caches loaded from it.
///
/// Built when a session starts and dropped when it ends. Nothing here is
/// shared with other sessions.
pub struct Journal {
    storage: Box<dyn StorageAdapter>,
    entries: EntryRepository,
    references: ReferenceLists,
}

impl Journal {
    /// Loads the working set, failing if the store cannot be reached.
    pub fn open(storage: Box<dyn StorageAdapter>) -> JournalResult<Self> {
        let mut journal = Self::empty(storage);
        journal.reload()?;
        Ok(journal)
    }

    /// Like [`Journal::open`], but starts from an empty working set when the
    /// store is unavailable. Call [`Journal::reload`] to retry later.
    pub fn open_or_empty(storage: Box<dyn StorageAdapter>) -> Self {
        let mut journal = Self::empty(storage);
        if let Err(err) = journal.reload() {
            warn!("starting with an empty journal: {err}");
        }
        journal
    }

    fn empty(storage: Box<dyn StorageAdapter>) -> Self {
        Self {
            storage,
            entries: EntryRepository::default(),
            references: ReferenceLists::default(),
        }
    }

    /// Replaces the caches with a fresh load. On failure the caches are kept.
    pub fn reload(&mut self) -> JournalResult<()> {
        let snapshot = self.storage.load()?;
        info!(
            "loaded {} entries, {} people, {} sites, {} species from {}",
            snapshot.entries.len(),
            snapshot.people.len(),
            snapshot.sites.len(),
            snapshot.species.len(),
            self.storage.backend_info()
        );

        self.references = ReferenceLists::from_snapshot(&snapshot);
        self.entries = EntryRepository::new(snapshot.entries);
        Ok(())
    }

    pub fn backend_info(&self) -> &str {
        self.storage.backend_info()
    }

    // Entries

    pub fn entries(&self) -> &[Entry] {
        self.entries.list()
    }

    pub fn entry(&self, id: &EntryId) -> Option<&Entry> {
        self.entries.get(id)
    }

    pub fn entries_on_date(&self, date: NaiveDate) -> Vec<&Entry> {
        self.entries.entries_on_date(date)
    }

    pub fn entries_in_range(&self, range: &DateRange) -> Vec<&Entry> {
        self.entries.entries_in_range(range)
    }

    pub fn create_entry(&mut self, draft: EntryDraft) -> JournalResult<Entry> {
        self.entries.create(self.storage.as_ref(), draft)
    }

    pub fn update_entry(&mut self, id: &EntryId, patch: &EntryPatch) -> JournalResult<Option<Entry>> {
        self.entries.update(self.storage.as_ref(), id, patch)
    }

    pub fn delete_entry(&mut self, id: &EntryId) -> JournalResult<bool> {
        self.entries.delete(self.storage.as_ref(), id)
    }

    // Reference lists

    pub fn references(&self, category: Category) -> Vec<&str> {
        self.references.list(category)
    }

    pub fn reference_items(&self, category: Category) -> &[ReferenceItem] {
        self.references.items(category)
    }

    pub fn add_reference(&mut self, category: Category, name: &str) -> JournalResult<ReferenceItem> {
        self.references.add(self.storage.as_ref(), category, name)
    }

    pub fn remove_reference(&mut self, category: Category, id_or_name: &str) -> JournalResult<bool> {
        self.references.remove(self.storage.as_ref(), category, id_or_name)
    }

    // Reports

    pub fn aggregate(&self, group_by: GroupBy, period: Period, today: NaiveDate) -> Vec<HoursTotal> {
        aggregation::aggregate(self.entries(), group_by, period, today)
    }

    pub fn report(&self, period: Period, today: NaiveDate) -> Report {
        aggregation::report(self.entries(), period, today)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::test_utils::test_harness::{FlakyStorage, TestLocalStorage};
    use crate::infrastructure::DuckDbStorage;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn in_memory_journal() -> Journal {
        Journal::open(Box::new(DuckDbStorage::in_memory().unwrap())).unwrap()
    }

    #[test]
    fn test_weed_day_scenario() {
        let mut journal = in_memory_journal();

        let first = journal
            .create_entry(EntryDraft::new(date(2024, 1, 1), "Volunteer A", "River Bank", "Gorse", 2.0))
            .unwrap();
        let second = journal
            .create_entry(EntryDraft::new(date(2024, 1, 2), "Volunteer A", "Wetland", "Gorse", 3.0))
            .unwrap();
        let third = journal
            .create_entry(EntryDraft::new(
                date(2024, 1, 1),
                "Volunteer B",
                "River Bank",
                "Blackberry",
                1.0,
            ))
            .unwrap();

        assert_eq!(
            journal.aggregate(GroupBy::Species, Period::All, date(2026, 10, 18)),
            vec![HoursTotal::new("Gorse", 5.0), HoursTotal::new("Blackberry", 1.0)]
        );

        let on_first: Vec<_> = journal
            .entries_on_date(date(2024, 1, 1))
            .into_iter()
            .map(|entry| entry.id.clone())
            .collect();
        assert_eq!(on_first.len(), 2);
        assert!(on_first.contains(&first.id));
        assert!(on_first.contains(&third.id));
        assert!(!on_first.contains(&second.id));
    }

    #[test]
    fn test_removing_unreferenced_site_leaves_entries_alone() {
        let mut journal = in_memory_journal();
        journal.add_reference(Category::Sites, "River Bank").unwrap();
        journal.add_reference(Category::Sites, "Wetland").unwrap();
        journal
            .create_entry(EntryDraft::new(date(2024, 1, 1), "A", "Wetland", "Gorse", 2.0))
            .unwrap();
        let entries_before = journal.entries().to_vec();

        assert!(journal.remove_reference(Category::Sites, "River Bank").unwrap());

        assert_eq!(journal.references(Category::Sites), vec!["Wetland"]);
        assert_eq!(journal.entries(), entries_before.as_slice());
    }

    #[test]
    fn test_removing_referenced_name_keeps_orphaned_entries() {
        let mut journal = in_memory_journal();
        journal.add_reference(Category::Species, "Gorse").unwrap();
        journal
            .create_entry(EntryDraft::new(date(2024, 1, 1), "A", "Wetland", "Gorse", 2.0))
            .unwrap();

        journal.remove_reference(Category::Species, "Gorse").unwrap();

        assert!(journal.references(Category::Species).is_empty());
        assert_eq!(journal.entries()[0].species_name, "Gorse");
    }

    #[test]
    fn test_removing_a_site_spares_one_named_after_its_id() {
        let mut journal = in_memory_journal();
        let wetland = journal.add_reference(Category::Sites, "Wetland").unwrap();
        journal.add_reference(Category::Sites, &wetland.id).unwrap();

        journal.remove_reference(Category::Sites, "Wetland").unwrap();
        let cached = journal.reference_items(Category::Sites).to_vec();
        journal.reload().unwrap();

        assert_eq!(journal.references(Category::Sites), vec![wetland.id.as_str()]);
        assert_eq!(journal.reference_items(Category::Sites), cached.as_slice());
    }

    #[test]
    fn test_reload_matches_cache_after_mutations() {
        let test_storage = TestLocalStorage::seeded();
        let mut journal = Journal::open(Box::new(test_storage.reopen())).unwrap();
        assert_eq!(journal.references(Category::People).len(), 3);

        let entry = journal
            .create_entry(EntryDraft::new(date(2024, 3, 1), "Kaitiaki 1", "Wetland", "Gorse", 1.5))
            .unwrap();
        journal
            .update_entry(&entry.id, &EntryPatch::new().notes(Some("seed heads bagged".into())))
            .unwrap();
        journal.add_reference(Category::People, "Volunteer C").unwrap();
        let cached_entries = journal.entries().to_vec();
        let cached_people: Vec<String> = journal
            .references(Category::People)
            .into_iter()
            .map(String::from)
            .collect();

        journal.reload().unwrap();

        assert_eq!(journal.entries(), cached_entries.as_slice());
        assert_eq!(journal.references(Category::People), cached_people);
    }

    #[test]
    fn test_unavailable_store_falls_back_to_empty_working_set() {
        let test_storage = TestLocalStorage::seeded();
        let (storage, failing) = FlakyStorage::new(test_storage.reopen());
        failing.set(true);

        let mut journal = Journal::open_or_empty(Box::new(storage));
        assert!(journal.entries().is_empty());
        assert!(journal.references(Category::Sites).is_empty());

        let err = journal.reload().unwrap_err();
        assert!(err.is_recoverable());

        failing.set(false);
        journal.reload().unwrap();
        assert_eq!(journal.references(Category::Sites).len(), 4);
    }

    #[test]
    fn test_failed_reload_keeps_existing_cache() {
        let test_storage = TestLocalStorage::seeded();
        let (storage, failing) = FlakyStorage::new(test_storage.reopen());
        let mut journal = Journal::open(Box::new(storage)).unwrap();

        failing.set(true);
        assert!(journal.reload().is_err());
        assert_eq!(journal.references(Category::Species).len(), 5);
    }
}
