use crate::application::{Config, TextRenderer};
use crate::domain::{DateRange, GroupBy, Journal, Period};
use crate::entities::{Category, EntryDraft, EntryId, EntryPatch};
use crate::infrastructure::{OfflineStorage, StorageAdapter};
use anyhow::{Context, Result, anyhow};
use chrono::{Local, NaiveDate};
use log::warn;

pub struct JournalApp {
    pub journal: Journal,
    config: Config,
    renderer: TextRenderer,
    today: NaiveDate,
}

impl JournalApp {
    /// Opens the configured store. A store that cannot be opened or loaded
    /// leaves the app on an empty working set; mutations then report the
    /// store as unavailable.
    pub fn new(config: Config) -> Self {
        let storage: Box<dyn StorageAdapter> = match config.open_storage() {
            Ok(storage) => storage,
            Err(err) => {
                warn!("could not open the {} store: {err:#}", config.backend.name());
                Box::new(OfflineStorage::new(config.backend.name(), format!("{err:#}")))
            }
        };
        Self::with_journal(config, Journal::open_or_empty(storage))
    }

    pub fn with_journal(config: Config, journal: Journal) -> Self {
        Self {
            journal,
            config,
            renderer: TextRenderer::new(),
            today: Local::now().date_naive(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    /// Pins "today"; reports and date defaults are relative to it.
    pub fn set_today(&mut self, today: NaiveDate) {
        self.today = today;
    }

    pub fn parse_date(&self, raw: Option<&str>) -> Result<NaiveDate> {
        match raw {
            Some(raw) => crate::entities::iso_date::parse(raw)
                .ok_or_else(|| anyhow!("Invalid date `{raw}`, expected YYYY-MM-DD")),
            None => Ok(self.today),
        }
    }

    pub fn parse_month(&self, raw: Option<&str>) -> Result<DateRange> {
        let Some(raw) = raw else {
            return Ok(DateRange::month_of(self.today));
        };
        let first = NaiveDate::parse_from_str(&format!("{}-01", raw.trim()), "%Y-%m-%d")
            .with_context(|| format!("Invalid month `{raw}`, expected YYYY-MM"))?;
        Ok(DateRange::month_of(first))
    }

    // Entries

    pub fn log_entry(&mut self, draft: EntryDraft) -> Result<String> {
        let entry = self
            .journal
            .create_entry(draft)
            .context("Failed to log hours")?;
        Ok(format!("Logged {}", self.renderer.render_entry(&entry)))
    }

    pub fn edit_entry(&mut self, id: &str, patch: EntryPatch) -> Result<String> {
        if patch.is_empty() {
            return Ok("Nothing to change.".to_string());
        }

        let id = EntryId::new(id);
        match self
            .journal
            .update_entry(&id, &patch)
            .with_context(|| format!("Failed to update entry {id}"))?
        {
            Some(entry) => Ok(format!("Updated {}", self.renderer.render_entry(&entry))),
            None => Ok(format!("No entry with id {id}.")),
        }
    }

    pub fn delete_entry(&mut self, id: &str) -> Result<String> {
        let id = EntryId::new(id);
        let removed = self
            .journal
            .delete_entry(&id)
            .with_context(|| format!("Failed to delete entry {id}"))?;
        Ok(if removed {
            format!("Deleted entry {id}.")
        } else {
            format!("No entry with id {id}.")
        })
    }

    pub fn list_entries(&self, date: Option<NaiveDate>) -> String {
        match date {
            Some(date) => self.renderer.render_entries(self.journal.entries_on_date(date)),
            None => self.renderer.render_entries(self.journal.entries()),
        }
    }

    pub fn show_range(&self, range: &DateRange) -> String {
        self.renderer
            .render_range(range, &self.journal.entries_in_range(range))
    }

    // Reference lists

    pub fn list_references(&self, category: Category) -> String {
        self.renderer
            .render_references(category, &self.journal.references(category))
    }

    pub fn add_reference(&mut self, category: Category, name: &str) -> Result<String> {
        let before = self.journal.reference_items(category).len();
        let item = self
            .journal
            .add_reference(category, name)
            .with_context(|| format!("Failed to add {}", category.singular()))?;

        Ok(if self.journal.reference_items(category).len() > before {
            format!("Added {} `{}`.", category.singular(), item.name)
        } else {
            format!("{} `{}` is already listed.", capitalize(category.singular()), item.name)
        })
    }

    pub fn remove_reference(&mut self, category: Category, id_or_name: &str) -> Result<String> {
        let removed = self
            .journal
            .remove_reference(category, id_or_name)
            .with_context(|| format!("Failed to remove {}", category.singular()))?;
        Ok(if removed {
            format!("Removed {} `{id_or_name}`.", category.singular())
        } else {
            format!("No {} `{id_or_name}` listed.", category.singular())
        })
    }

    // Reports

    pub fn report(&self, period: Period, group_by: Option<GroupBy>) -> String {
        match group_by {
            Some(group_by) => {
                let rows = self.journal.aggregate(group_by, period, self.today);
                let title = format!("Hours by {}", capitalize(&group_by.to_string()));
                self.renderer.render_totals(&title, &rows)
            }
            None => self
                .renderer
                .render_report(&self.journal.report(period, self.today)),
        }
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
