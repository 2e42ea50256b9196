use crate::domain::{DateRange, HoursTotal, Period, Report};
use crate::entities::{Category, Entry};
use std::fmt::Write;

/// Plain-text views over the journal. Hours are shown to one decimal place.
pub struct TextRenderer;

impl TextRenderer {
    pub fn new() -> Self {
        Self
    }

    pub fn render_entry(&self, entry: &Entry) -> String {
        let mut line = format!(
            "[{}] {}  {:>5.1}h  {} @ {} ({})",
            entry.id,
            entry.date,
            entry.hours,
            entry.species_name,
            entry.site_name,
            entry.person_name
        );
        if let Some(notes) = entry.notes.as_deref().filter(|notes| !notes.is_empty()) {
            let _ = write!(line, "\n      {notes}");
        }
        line
    }

    pub fn render_entries<'e>(&self, entries: impl IntoIterator<Item = &'e Entry>) -> String {
        let lines: Vec<String> = entries
            .into_iter()
            .map(|entry| self.render_entry(entry))
            .collect();
        if lines.is_empty() {
            "No entries.".to_string()
        } else {
            lines.join("\n")
        }
    }

    /// Day-by-day listing of `range`; days without entries are skipped.
    pub fn render_range(&self, range: &DateRange, entries: &[&Entry]) -> String {
        let mut out = format!("=== {range} ===\n");
        let mut total = 0.0;
        let mut any = false;

        for day in range.days() {
            let on_day: Vec<&Entry> = entries
                .iter()
                .copied()
                .filter(|entry| entry.date == day)
                .collect();
            if on_day.is_empty() {
                continue;
            }

            let day_hours: f64 = on_day.iter().map(|entry| entry.hours).sum();
            total += day_hours;
            any = true;
            let _ = writeln!(out, "\n{} ({:.1}h)", day.format("%a %-d %b"), day_hours);
            for entry in on_day {
                let _ = writeln!(out, "  {}", self.render_entry(entry));
            }
        }

        if !any {
            out.push_str("\nNo entries.\n");
        } else {
            let _ = writeln!(out, "\nTotal: {total:.1}h");
        }
        out
    }

    pub fn render_references(&self, category: Category, names: &[&str]) -> String {
        if names.is_empty() {
            return format!("No {category} yet.");
        }
        names
            .iter()
            .map(|name| format!("  {name}"))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn render_totals(&self, title: &str, rows: &[HoursTotal]) -> String {
        let mut out = format!("{title}\n");
        if rows.is_empty() {
            out.push_str("  No data for this period.\n");
            return out;
        }

        let width = rows
            .iter()
            .map(|row| row.label.chars().count())
            .max()
            .unwrap_or(0);
        for row in rows {
            let _ = writeln!(out, "  {:<width$}  {:>6.1}h", row.label, row.hours);
        }
        out
    }

    pub fn render_report(&self, report: &Report) -> String {
        let heading = match (&report.period, &report.range) {
            (Period::All, _) | (_, None) => "All time".to_string(),
            (_, Some(range)) => range.to_string(),
        };

        let mut out = format!("=== Report: {heading} ===\n\n");
        out.push_str(&self.render_totals("Hours by Species", &report.by_species));
        out.push('\n');
        out.push_str(&self.render_totals("Hours by Site", &report.by_site));
        let _ = write!(out, "\nTotal: {:.1}h", report.total_hours);
        out
    }
}

impl Default for TextRenderer {
    fn default() -> Self {
        Self::new()
    }
}
