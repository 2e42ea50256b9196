/// Test utilities for storage-backed tests
///
/// Each harness creates a fresh store inside its own temporary directory and
/// cleans it up when dropped, so tests never see each other's data.
///
/// ## Usage Examples
///
/// ```rust
/// use crate::infrastructure::test_utils::test_harness::TestStorage;
///
/// #[test]
/// fn my_test() {
///     let test_storage = TestStorage::new();
///     let storage = test_storage.storage();
///
///     // Use storage for testing...
///     // Database is automatically cleaned up when test_storage is dropped
/// }
/// ```
#[cfg(test)]
pub mod test_harness {
    use crate::entities::{Category, EntryDraft, EntryId, EntryPatch, Snapshot};
    use crate::error::{JournalError, JournalResult};
    use crate::infrastructure::{DuckDbStorage, LocalStorage, StorageAdapter};
    use std::cell::Cell;
    use std::path::{Path, PathBuf};
    use std::rc::Rc;
    use tempfile::TempDir;

    /// Fresh DuckDB database in a temporary directory
    pub struct TestStorage {
        pub storage: DuckDbStorage,
        _temp_dir: TempDir, // Keep temp dir alive
    }

    impl TestStorage {
        pub fn new() -> Self {
            let temp_dir = TempDir::new().expect("Failed to create temp directory");
            let db_path = temp_dir.path().join("test.db");

            let storage =
                DuckDbStorage::new(&db_path).expect("Failed to initialize test DuckDB storage");

            Self {
                storage,
                _temp_dir: temp_dir,
            }
        }

        pub fn storage(&self) -> &DuckDbStorage {
            &self.storage
        }

        /// Get database path (useful for debugging)
        pub fn db_path(&self) -> PathBuf {
            self._temp_dir.path().join("test.db")
        }
    }

    /// Fresh local blob store in a temporary directory
    pub struct TestLocalStorage {
        pub storage: LocalStorage,
        temp_dir: TempDir,
    }

    impl TestLocalStorage {
        /// Store that starts with empty reference lists
        pub fn new() -> Self {
            Self::open(false)
        }

        /// Store seeded with the default people, sites and species
        pub fn seeded() -> Self {
            Self::open(true)
        }

        fn open(seed_defaults: bool) -> Self {
            let temp_dir = TempDir::new().expect("Failed to create temp directory");
            let storage = LocalStorage::open(temp_dir.path(), seed_defaults)
                .expect("Failed to open test local storage");
            // writes the initial (possibly seeded) blob
            storage.load().expect("Failed to initialize test local storage");

            Self { storage, temp_dir }
        }

        pub fn storage(&self) -> &LocalStorage {
            &self.storage
        }

        pub fn dir(&self) -> &Path {
            self.temp_dir.path()
        }

        /// A second handle on the same blob, e.g. to box into a `Journal`
        pub fn reopen(&self) -> LocalStorage {
            LocalStorage::open(self.dir(), false).expect("Failed to reopen test local storage")
        }
    }

    /// Run a test with fresh test storage
    pub fn with_test_storage<F, R>(test_fn: F) -> R
    where
        F: FnOnce(&TestStorage) -> R,
    {
        let test_storage = TestStorage::new();
        test_fn(&test_storage)
    }

    /// Wraps a store and fails every call while its switch is on.
    ///
    /// The switch is shared, so a test can keep flipping it after the store
    /// has been boxed into a `Journal`.
    pub struct FlakyStorage<S> {
        inner: S,
        failing: Rc<Cell<bool>>,
    }

    impl<S: StorageAdapter> FlakyStorage<S> {
        pub fn new(inner: S) -> (Self, Rc<Cell<bool>>) {
            let failing = Rc::new(Cell::new(false));
            let storage = Self {
                inner,
                failing: Rc::clone(&failing),
            };
            (storage, failing)
        }

        fn check(&self) -> JournalResult<()> {
            if self.failing.get() {
                return Err(JournalError::unavailable("simulated connection failure"));
            }
            Ok(())
        }
    }

    impl<S: StorageAdapter> StorageAdapter for FlakyStorage<S> {
        fn load(&self) -> JournalResult<Snapshot> {
            self.check()?;
            self.inner.load()
        }

        fn create_entry(&self, draft: &EntryDraft) -> JournalResult<EntryId> {
            self.check()?;
            self.inner.create_entry(draft)
        }

        fn update_entry(&self, id: &EntryId, patch: &EntryPatch) -> JournalResult<bool> {
            self.check()?;
            self.inner.update_entry(id, patch)
        }

        fn delete_entry(&self, id: &EntryId) -> JournalResult<bool> {
            self.check()?;
            self.inner.delete_entry(id)
        }

        fn create_reference(&self, category: Category, name: &str) -> JournalResult<String> {
            self.check()?;
            self.inner.create_reference(category, name)
        }

        fn delete_reference(&self, category: Category, id_or_name: &str) -> JournalResult<bool> {
            self.check()?;
            self.inner.delete_reference(category, id_or_name)
        }

        fn backend_info(&self) -> &str {
            self.inner.backend_info()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_harness::*;
    use crate::entities::Category;
    use crate::infrastructure::StorageAdapter;

    #[test]
    fn test_harness_isolation() {
        // Each test gets a fresh database
        let test_storage1 = TestStorage::new();
        let test_storage2 = TestStorage::new();

        test_storage1
            .storage()
            .create_reference(Category::Sites, "Wetland")
            .unwrap();

        assert!(test_storage2.storage().load().unwrap().sites.is_empty());
    }

    #[test]
    fn test_flaky_storage_fails_only_while_switched_on() {
        let test_storage = TestLocalStorage::new();
        let (storage, failing) = FlakyStorage::new(test_storage.reopen());

        failing.set(true);
        assert!(storage.load().unwrap_err().is_recoverable());

        failing.set(false);
        assert!(storage.load().is_ok());
    }
}
