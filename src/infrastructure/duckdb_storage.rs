use crate::entities::{
    Category, Entry, EntryDraft, EntryId, EntryPatch, ReferenceItem, Snapshot, iso_date,
};
use crate::error::{JournalError, JournalResult, StoreContext};
use crate::infrastructure::storage::StorageAdapter;
use chrono::NaiveDate;
use duckdb::{Connection, OptionalExt, Row, params};
use log::{debug, info};
use std::collections::HashSet;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// Schema migrations, applied in order and recorded in `migrations`.
const MIGRATIONS: &[(i32, &str, &str)] = &[(
    1,
    "001_initial_schema",
    include_str!("../../migrations/001_initial_schema.sql"),
)];

const ENTRY_SELECT_SQL: &str = "SELECT
    id,
    date,
    person_name,
    site_name,
    species_name,
    hours,
    notes
FROM entries";

/// Tabular record store: one table per record set, ids from sequences.
pub struct DuckDbStorage {
    conn: Mutex<Connection>,
}

impl DuckDbStorage {
    pub fn new<P: AsRef<Path>>(db_path: P) -> JournalResult<Self> {
        let db_path = db_path.as_ref();
        let conn = Connection::open(db_path)
            .with_store_context(|| format!("Failed to open DuckDB at {}", db_path.display()))?;

        let storage = Self {
            conn: Mutex::new(conn),
        };
        storage.initialize()?;
        info!("opened DuckDB store at {}", db_path.display());
        Ok(storage)
    }

    pub fn in_memory() -> JournalResult<Self> {
        let conn = Connection::open_in_memory()
            .store_context("Failed to create in-memory DuckDB connection")?;

        let storage = Self {
            conn: Mutex::new(conn),
        };
        storage.initialize()?;
        Ok(storage)
    }

    fn initialize(&self) -> JournalResult<()> {
        self.setup_migration_system()?;
        self.run_migrations()?;
        Ok(())
    }

    fn conn(&self) -> JournalResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| JournalError::unavailable("DuckDB connection lock poisoned"))
    }

    fn setup_migration_system(&self) -> JournalResult<()> {
        let conn = self.conn()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS migrations (
                version INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                applied_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            );
        "#,
        )
        .store_context("Failed to create migrations table")?;
        Ok(())
    }

    fn run_migrations(&self) -> JournalResult<()> {
        let applied = self.get_applied_migrations()?;

        for &(version, name, sql_content) in MIGRATIONS {
            if !applied.contains(&version) {
                self.apply_migration(version, name, sql_content)?;
            }
        }

        Ok(())
    }

    fn get_applied_migrations(&self) -> JournalResult<HashSet<i32>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT version FROM migrations ORDER BY version")
            .store_context("Failed to prepare migration query")?;

        let rows = stmt
            .query_map([], |row| row.get::<_, i32>(0))
            .store_context("Failed to query applied migrations")?;

        let mut applied = HashSet::new();
        for version in rows {
            applied.insert(version.store_context("Failed to read migration version")?);
        }

        Ok(applied)
    }

    fn apply_migration(&self, version: i32, name: &str, sql_content: &str) -> JournalResult<()> {
        let conn = self.conn()?;

        conn.execute_batch(sql_content)
            .with_store_context(|| format!("Failed to execute migration SQL for {name}"))?;

        conn.execute(
            "INSERT INTO migrations (version, name) VALUES (?, ?)",
            params![version, name],
        )
        .with_store_context(|| format!("Failed to record migration {name} as applied"))?;

        info!("applied migration {version}: {name}");
        Ok(())
    }

    fn load_entries(conn: &Connection) -> JournalResult<Vec<Entry>> {
        let mut stmt = conn
            .prepare(&format!("{ENTRY_SELECT_SQL} ORDER BY id"))
            .store_context("Failed to prepare select statement")?;

        let rows = stmt
            .query_map([], entry_from_row)
            .store_context("Failed to query entries")?;

        let mut entries = Vec::new();
        for entry in rows {
            entries.push(entry.store_context("Failed to read entry row")?);
        }

        Ok(entries)
    }

    fn load_references(conn: &Connection, category: Category) -> JournalResult<Vec<ReferenceItem>> {
        let mut stmt = conn
            .prepare(&format!(
                "SELECT id, name FROM {} ORDER BY id",
                category.table_name()
            ))
            .with_store_context(|| format!("Failed to prepare {category} query"))?;

        let rows = stmt
            .query_map([], |row| {
                let id: i64 = row.get(0)?;
                let name: String = row.get(1)?;
                Ok(ReferenceItem::new(id.to_string(), name))
            })
            .with_store_context(|| format!("Failed to query {category}"))?;

        let mut items = Vec::new();
        for item in rows {
            items.push(item.with_store_context(|| format!("Failed to read {category} row"))?);
        }

        Ok(items)
    }

    /// The single row `id_or_name` refers to. An id match wins over a name match.
    fn resolve_reference(
        conn: &Connection,
        category: Category,
        id_or_name: &str,
    ) -> JournalResult<Option<i64>> {
        let table = category.table_name();

        if let Ok(id) = id_or_name.parse::<i64>() {
            let by_id: Option<i64> = conn
                .query_row(
                    &format!("SELECT id FROM {table} WHERE id = ?"),
                    params![id],
                    |row| row.get(0),
                )
                .optional()
                .with_store_context(|| format!("Failed to look up {} #{id}", category.singular()))?;
            if by_id.is_some() {
                return Ok(by_id);
            }
        }

        conn.query_row(
            &format!("SELECT id FROM {table} WHERE name = ?"),
            params![id_or_name],
            |row| row.get(0),
        )
        .optional()
        .with_store_context(|| format!("Failed to look up {} `{id_or_name}`", category.singular()))
    }

    fn next_id(conn: &Connection, sequence: &str) -> JournalResult<i64> {
        conn.query_row(&format!("SELECT nextval('{sequence}')"), [], |row| {
            row.get(0)
        })
        .with_store_context(|| format!("Failed to draw id from {sequence}"))
    }
}

impl StorageAdapter for DuckDbStorage {
    fn load(&self) -> JournalResult<Snapshot> {
        let conn = self.conn()?;

        Ok(Snapshot {
            entries: Self::load_entries(&conn)?,
            people: Self::load_references(&conn, Category::People)?,
            sites: Self::load_references(&conn, Category::Sites)?,
            species: Self::load_references(&conn, Category::Species)?,
        })
    }

    fn create_entry(&self, draft: &EntryDraft) -> JournalResult<EntryId> {
        let conn = self.conn()?;
        let id = Self::next_id(&conn, "entry_ids")?;

        conn.execute(
            r#"
            INSERT INTO entries (
                id, date, person_name, site_name, species_name, hours, notes
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
            params![
                id,
                draft.date.format(iso_date::FORMAT).to_string(),
                draft.person_name,
                draft.site_name,
                draft.species_name,
                draft.hours,
                draft.notes
            ],
        )
        .store_context("Failed to insert entry")?;

        debug!("inserted entry {id}");
        Ok(EntryId::new(id.to_string()))
    }

    fn update_entry(&self, id: &EntryId, patch: &EntryPatch) -> JournalResult<bool> {
        let Ok(row_id) = id.as_str().parse::<i64>() else {
            return Ok(false);
        };

        let conn = self.conn()?;
        let current = conn
            .query_row(
                &format!("{ENTRY_SELECT_SQL} WHERE id = ?"),
                params![row_id],
                entry_from_row,
            )
            .optional()
            .store_context("Failed to load entry for update")?;

        let Some(mut entry) = current else {
            return Ok(false);
        };
        patch.apply(&mut entry);

        let changed = conn
            .execute(
                r#"
                UPDATE entries SET
                    date = ?,
                    person_name = ?,
                    site_name = ?,
                    species_name = ?,
                    hours = ?,
                    notes = ?,
                    updated_at = CURRENT_TIMESTAMP
                WHERE id = ?
            "#,
                params![
                    entry.date.format(iso_date::FORMAT).to_string(),
                    entry.person_name,
                    entry.site_name,
                    entry.species_name,
                    entry.hours,
                    entry.notes,
                    row_id
                ],
            )
            .store_context("Failed to update entry")?;

        Ok(changed > 0)
    }

    fn delete_entry(&self, id: &EntryId) -> JournalResult<bool> {
        let Ok(row_id) = id.as_str().parse::<i64>() else {
            return Ok(false);
        };

        let conn = self.conn()?;
        let deleted = conn
            .execute("DELETE FROM entries WHERE id = ?", params![row_id])
            .store_context("Failed to delete entry")?;

        Ok(deleted > 0)
    }

    fn create_reference(&self, category: Category, name: &str) -> JournalResult<String> {
        let conn = self.conn()?;
        let table = category.table_name();

        let existing: Option<i64> = conn
            .query_row(
                &format!("SELECT id FROM {table} WHERE name = ?"),
                params![name],
                |row| row.get(0),
            )
            .optional()
            .with_store_context(|| format!("Failed to look up {} `{name}`", category.singular()))?;

        if let Some(id) = existing {
            return Ok(id.to_string());
        }

        let id = Self::next_id(&conn, "reference_ids")?;
        conn.execute(
            &format!("INSERT INTO {table} (id, name) VALUES (?, ?)"),
            params![id, name],
        )
        .with_store_context(|| format!("Failed to insert {} `{name}`", category.singular()))?;

        Ok(id.to_string())
    }

    fn delete_reference(&self, category: Category, id_or_name: &str) -> JournalResult<bool> {
        let conn = self.conn()?;
        let Some(row_id) = Self::resolve_reference(&conn, category, id_or_name)? else {
            return Ok(false);
        };

        let deleted = conn
            .execute(
                &format!("DELETE FROM {} WHERE id = ?", category.table_name()),
                params![row_id],
            )
            .with_store_context(|| format!("Failed to delete {} `{id_or_name}`", category.singular()))?;

        Ok(deleted > 0)
    }

    fn backend_info(&self) -> &str {
        "DuckDB Storage Backend v1.0"
    }
}

fn entry_from_row(row: &Row<'_>) -> duckdb::Result<Entry> {
    let id: i64 = row.get(0)?;
    let date_str: String = row.get(1)?;
    let date = NaiveDate::parse_from_str(&date_str, iso_date::FORMAT).map_err(|e| {
        duckdb::Error::FromSqlConversionFailure(1, duckdb::types::Type::Text, Box::new(e))
    })?;

    Ok(Entry {
        id: EntryId::new(id.to_string()),
        date,
        person_name: row.get(2)?,
        site_name: row.get(3)?,
        species_name: row.get(4)?,
        hours: row.get(5)?,
        notes: row.get(6)?,
    })
}
