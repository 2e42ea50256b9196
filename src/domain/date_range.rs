use chrono::{Datelike, Duration, NaiveDate};
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum ViewScope {
    Day(NaiveDate),
    Week(NaiveDate),  // Start of week (Sunday)
    Month(NaiveDate), // Start of month
}

/// Inclusive span of calendar days.
#[derive(Debug, Clone, PartialEq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub scope: ViewScope,
}

impl DateRange {
    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn day(date: NaiveDate) -> Self {
        Self {
            start: date,
            end: date,
            scope: ViewScope::Day(date),
        }
    }

    pub fn week(start_of_week: NaiveDate) -> Self {
        let end = start_of_week + Duration::days(6);
        Self {
            start: start_of_week,
            end,
            scope: ViewScope::Week(start_of_week),
        }
    }

    /// The Sunday-to-Saturday week containing `date`.
    pub fn week_of(date: NaiveDate) -> Self {
        Self::week(week_start(date))
    }

    /// Returns `None` for an invalid year/month pair.
    pub fn month(year: i32, month: u32) -> Option<Self> {
        let start = NaiveDate::from_ymd_opt(year, month, 1)?;
        let end = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)
        }?
        .pred_opt()?;

        Some(Self {
            start,
            end,
            scope: ViewScope::Month(start),
        })
    }

    /// The calendar month containing `date`.
    pub fn month_of(date: NaiveDate) -> Self {
        Self::month(date.year(), date.month()).unwrap_or_else(|| Self::day(date))
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let start = self.start;
        let end = self.end;
        (0..=(end - start).num_days()).map(move |i| start + Duration::days(i))
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.scope {
            ViewScope::Day(date) => write!(f, "{}", date.format("%A %-d %B %Y")),
            ViewScope::Week(start) => write!(
                f,
                "Week of {} to {}",
                start.format("%-d %b"),
                self.end.format("%-d %b %Y")
            ),
            ViewScope::Month(start) => write!(f, "{}", start.format("%B %Y")),
        }
    }
}

/// Start of the week (Sunday) for a given date.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_sunday() as i64)
}
