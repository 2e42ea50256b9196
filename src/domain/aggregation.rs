use crate::domain::DateRange;
use crate::entities::Entry;
use chrono::NaiveDate;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

/// Label for entries whose grouping field is blank.
pub const UNKNOWN_LABEL: &str = "Unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum GroupBy {
    Species,
    Site,
    Person,
}

impl GroupBy {
    fn label<'e>(&self, entry: &'e Entry) -> &'e str {
        let raw = match self {
            GroupBy::Species => &entry.species_name,
            GroupBy::Site => &entry.site_name,
            GroupBy::Person => &entry.person_name,
        };
        let trimmed = raw.trim();
        if trimmed.is_empty() { UNKNOWN_LABEL } else { trimmed }
    }
}

impl fmt::Display for GroupBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GroupBy::Species => "species",
            GroupBy::Site => "site",
            GroupBy::Person => "person",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Period {
    #[default]
    Week,
    Month,
    All,
}

impl Period {
    /// The inclusive window this period covers around `today`; `None` for all time.
    pub fn range(&self, today: NaiveDate) -> Option<DateRange> {
        match self {
            Period::Week => Some(DateRange::week_of(today)),
            Period::Month => Some(DateRange::month_of(today)),
            Period::All => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HoursTotal {
    pub label: String,
    pub hours: f64,
}

impl HoursTotal {
    pub fn new(label: impl Into<String>, hours: f64) -> Self {
        Self {
            label: label.into(),
            hours,
        }
    }
}

/// Both report tables for one period.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub period: Period,
    pub range: Option<DateRange>,
    pub by_species: Vec<HoursTotal>,
    pub by_site: Vec<HoursTotal>,
    pub total_hours: f64,
}

pub fn filter_period(entries: &[Entry], period: Period, today: NaiveDate) -> Vec<&Entry> {
    match period.range(today) {
        Some(range) => entries
            .iter()
            .filter(|entry| range.contains(entry.date))
            .collect(),
        None => entries.iter().collect(),
    }
}

/// Sums hours per `group_by` label over the entries inside `period`.
///
/// Sorted by total hours descending, then label ascending.
pub fn aggregate(
    entries: &[Entry],
    group_by: GroupBy,
    period: Period,
    today: NaiveDate,
) -> Vec<HoursTotal> {
    group(filter_period(entries, period, today), group_by)
}

pub fn report(entries: &[Entry], period: Period, today: NaiveDate) -> Report {
    let filtered = filter_period(entries, period, today);
    let total_hours = filtered.iter().map(|entry| entry.hours).sum();

    Report {
        period,
        range: period.range(today),
        by_species: group(filtered.iter().copied(), GroupBy::Species),
        by_site: group(filtered.iter().copied(), GroupBy::Site),
        total_hours,
    }
}

fn group<'e>(entries: impl IntoIterator<Item = &'e Entry>, group_by: GroupBy) -> Vec<HoursTotal> {
    let mut totals: HashMap<&str, f64> = HashMap::new();
    for entry in entries {
        *totals.entry(group_by.label(entry)).or_insert(0.0) += entry.hours;
    }

    let mut rows: Vec<HoursTotal> = totals
        .into_iter()
        .map(|(label, hours)| HoursTotal::new(label, hours))
        .collect();
    rows.sort_by(|a, b| {
        b.hours
            .partial_cmp(&a.hours)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.label.cmp(&b.label))
    });
    rows
}
