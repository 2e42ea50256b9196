use crate::error::{JournalError, JournalResult};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Identifiers
// ============================================================================

/// Store-assigned entry identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(pub String);

impl EntryId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for EntryId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

// ============================================================================
// Entry
// ============================================================================

/// One logged block of volunteer hours against a species at a site.
///
/// Person, site and species are linked by name only. Deleting a reference
/// item leaves entries that mention it untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub id: EntryId,
    #[serde(with = "iso_date")]
    pub date: NaiveDate,
    #[serde(default, alias = "name")]
    pub person_name: String,
    #[serde(default, alias = "site")]
    pub site_name: String,
    #[serde(default, alias = "targetSpecies")]
    pub species_name: String,
    pub hours: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Entry {
    pub fn from_draft(id: EntryId, draft: EntryDraft) -> Self {
        Self {
            id,
            date: draft.date,
            person_name: draft.person_name,
            site_name: draft.site_name,
            species_name: draft.species_name,
            hours: draft.hours,
            notes: draft.notes,
        }
    }

    pub fn validate(&self) -> JournalResult<()> {
        validate_hours(self.hours)
    }

    /// The entry with its id stripped, as it was submitted for creation.
    pub fn to_draft(&self) -> EntryDraft {
        EntryDraft {
            date: self.date,
            person_name: self.person_name.clone(),
            site_name: self.site_name.clone(),
            species_name: self.species_name.clone(),
            hours: self.hours,
            notes: self.notes.clone(),
        }
    }
}

/// An entry that has not been stored yet.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryDraft {
    pub date: NaiveDate,
    pub person_name: String,
    pub site_name: String,
    pub species_name: String,
    pub hours: f64,
    pub notes: Option<String>,
}

impl EntryDraft {
    pub fn new(
        date: NaiveDate,
        person_name: impl Into<String>,
        site_name: impl Into<String>,
        species_name: impl Into<String>,
        hours: f64,
    ) -> Self {
        Self {
            date,
            person_name: person_name.into(),
            site_name: site_name.into(),
            species_name: species_name.into(),
            hours,
            notes: None,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn validate(&self) -> JournalResult<()> {
        validate_hours(self.hours)
    }
}

/// Partial update for an entry. Fields left as `None` keep their value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryPatch {
    pub date: Option<NaiveDate>,
    pub person_name: Option<String>,
    pub site_name: Option<String>,
    pub species_name: Option<String>,
    pub hours: Option<f64>,
    /// `Some(None)` clears the notes.
    pub notes: Option<Option<String>>,
}

impl EntryPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn person(mut self, name: impl Into<String>) -> Self {
        self.person_name = Some(name.into());
        self
    }

    pub fn site(mut self, name: impl Into<String>) -> Self {
        self.site_name = Some(name.into());
        self
    }

    pub fn species(mut self, name: impl Into<String>) -> Self {
        self.species_name = Some(name.into());
        self
    }

    pub fn hours(mut self, hours: f64) -> Self {
        self.hours = Some(hours);
        self
    }

    pub fn notes(mut self, notes: Option<String>) -> Self {
        self.notes = Some(notes);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.date.is_none()
            && self.person_name.is_none()
            && self.site_name.is_none()
            && self.species_name.is_none()
            && self.hours.is_none()
            && self.notes.is_none()
    }

    pub fn apply(&self, entry: &mut Entry) {
        if let Some(date) = self.date {
            entry.date = date;
        }
        if let Some(name) = &self.person_name {
            entry.person_name = name.clone();
        }
        if let Some(name) = &self.site_name {
            entry.site_name = name.clone();
        }
        if let Some(name) = &self.species_name {
            entry.species_name = name.clone();
        }
        if let Some(hours) = self.hours {
            entry.hours = hours;
        }
        if let Some(notes) = &self.notes {
            entry.notes = notes.clone();
        }
    }
}

fn validate_hours(hours: f64) -> JournalResult<()> {
    if !hours.is_finite() {
        return Err(JournalError::validation("hours", "must be a finite number"));
    }
    if hours < 0.0 {
        return Err(JournalError::validation(
            "hours",
            format!("must not be negative (got {hours})"),
        ));
    }
    Ok(())
}

// ============================================================================
// Reference lists
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum Category {
    People,
    Sites,
    Species,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::People, Category::Sites, Category::Species];

    /// Table (or blob key) holding this list.
    pub fn table_name(&self) -> &'static str {
        match self {
            Category::People => "people",
            Category::Sites => "sites",
            Category::Species => "species",
        }
    }

    pub fn singular(&self) -> &'static str {
        match self {
            Category::People => "person",
            Category::Sites => "site",
            Category::Species => "species",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.table_name())
    }
}

impl FromStr for Category {
    type Err = JournalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "people" | "person" => Ok(Category::People),
            "sites" | "site" => Ok(Category::Sites),
            "species" => Ok(Category::Species),
            other => Err(JournalError::validation(
                "category",
                format!("unknown reference list `{other}`"),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceItem {
    pub id: String,
    pub name: String,
}

impl ReferenceItem {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    /// Items keyed by their own name, as the local blob store keeps them.
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: name.clone(),
            name,
        }
    }
}

/// Trims a candidate reference name, rejecting blanks.
pub fn normalize_reference_name(category: Category, name: &str) -> JournalResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(JournalError::validation(
            "name",
            format!("{} name must not be blank", category.singular()),
        ));
    }
    Ok(trimmed.to_string())
}

// ============================================================================
// Snapshot
// ============================================================================

/// Everything a store holds, as returned by a full load.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub entries: Vec<Entry>,
    pub people: Vec<ReferenceItem>,
    pub sites: Vec<ReferenceItem>,
    pub species: Vec<ReferenceItem>,
}

impl Snapshot {
    pub fn references(&self, category: Category) -> &[ReferenceItem] {
        match category {
            Category::People => &self.people,
            Category::Sites => &self.sites,
            Category::Species => &self.species,
        }
    }

    pub fn references_mut(&mut self, category: Category) -> &mut Vec<ReferenceItem> {
        match category {
            Category::People => &mut self.people,
            Category::Sites => &mut self.sites,
            Category::Species => &mut self.species,
        }
    }
}

// ============================================================================
// Date serialization
// ============================================================================

/// Dates are written as `YYYY-MM-DD`. Full ISO-8601 timestamps are accepted
/// on read and reduced to the calendar date they fall on in the local time
/// zone, which is the day the user saw when the entry was logged.
pub mod iso_date {
    use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone};
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub const FORMAT: &str = "%Y-%m-%d";

    pub fn serialize<S>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&date.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| D::Error::custom(format!("invalid ISO-8601 date `{raw}`")))
    }

    pub fn parse(raw: &str) -> Option<NaiveDate> {
        parse_in(raw, &Local)
    }

    /// Like [`parse`], but timestamps with an offset land on `tz`'s calendar.
    /// Naive timestamps keep their own date.
    pub fn parse_in<Tz: TimeZone>(raw: &str, tz: &Tz) -> Option<NaiveDate> {
        let raw = raw.trim();
        if let Ok(date) = NaiveDate::parse_from_str(raw, FORMAT) {
            return Some(date);
        }
        if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
            return Some(timestamp.with_timezone(tz).date_naive());
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|timestamp| timestamp.date())
    }
}
