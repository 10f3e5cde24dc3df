use crate::analyzer::classifier::MoodClassifier;
use crate::analyzer::dates::{days_in_month, first_weekday};
use crate::journal::catalog::{MoodCatalog, shade};
use crate::journal::{JournalEntry, MoodTag};
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Band {
    pub mood: String,
    pub base_color: String,
    pub color: String,
    pub intensity: u8,
    pub pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DaySummary {
    pub day: u32,
    pub has_entry: bool,
    pub bands: Vec<Band>,
    pub is_today: bool,
    pub is_missed: bool,
    pub is_future: bool,
    pub inferred: bool,
}

impl DaySummary {
    /// Hard-stop gradient, one segment per band.
    pub fn css_gradient(&self) -> Option<String> {
        if self.bands.is_empty() {
            return None;
        }

        let mut start = 0.0_f64;
        let stops = self
            .bands
            .iter()
            .map(|band| {
                let end = (start + band.pct).min(100.0);
                let stop = format!("{} {:.1}% {:.1}%", band.color, start, end);
                start = end;
                stop
            })
            .collect::<Vec<_>>();

        Some(format!("linear-gradient(to right, {})", stops.join(", ")))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthCalendar {
    pub year: i32,
    /// Zero-based, January = 0.
    pub month: u32,
    pub leading_blanks: u32,
    pub cells: Vec<Option<DaySummary>>,
}

impl MonthCalendar {
    pub fn days(&self) -> BTreeMap<u32, &DaySummary> {
        self.cells
            .iter()
            .flatten()
            .map(|summary| (summary.day, summary))
            .collect()
    }

    fn empty(year: i32, month: u32) -> Self {
        Self {
            year,
            month,
            leading_blanks: 0,
            cells: Vec::new(),
        }
    }
}

pub struct CalendarAggregator<'a> {
    catalog: &'a MoodCatalog,
    classifier: Option<&'a dyn MoodClassifier>,
}

impl<'a> CalendarAggregator<'a> {
    pub fn new(catalog: &'a MoodCatalog) -> Self {
        Self {
            catalog,
            classifier: None,
        }
    }

    pub fn with_classifier(mut self, classifier: &'a dyn MoodClassifier) -> Self {
        self.classifier = Some(classifier);
        self
    }

    /// Buckets `entries` into the grid for `month` (0-11) of `year`.
    pub fn aggregate_month(
        &self,
        entries: &[JournalEntry],
        year: i32,
        month: u32,
        today: NaiveDate,
    ) -> MonthCalendar {
        let calendar_month = month.saturating_add(1);
        let (Some(blanks), Some(length)) = (
            first_weekday(year, calendar_month),
            days_in_month(year, calendar_month),
        ) else {
            warn!(year, month, "month out of range, returning empty calendar");
            return MonthCalendar::empty(year, month);
        };

        let by_day = entries
            .iter()
            .filter_map(|entry| match entry.day() {
                Some(date) => Some((date, entry)),
                None => {
                    debug!(date = %entry.date, "skipping entry with unparsable date");
                    None
                }
            })
            .filter(|(date, _)| date.year() == year && date.month() == calendar_month)
            .map(|(date, entry)| (date.day(), entry))
            .collect::<HashMap<_, _>>();

        let cells = (0..blanks)
            .map(|_| None)
            .chain((1..=length).map(|day| {
                let date = NaiveDate::from_ymd_opt(year, calendar_month, day).unwrap_or(today);
                Some(self.summarize(day, date, by_day.get(&day).copied(), today))
            }))
            .collect::<Vec<_>>();

        MonthCalendar {
            year,
            month,
            leading_blanks: blanks,
            cells,
        }
    }

    fn summarize(
        &self,
        day: u32,
        date: NaiveDate,
        entry: Option<&JournalEntry>,
        today: NaiveDate,
    ) -> DaySummary {
        let has_entry = entry.is_some();
        let (tags, inferred) = match entry {
            Some(entry) if !entry.moods.is_empty() => (entry.moods.clone(), false),
            Some(entry) => {
                let inferred = self.infer(entry);
                let was_inferred = !inferred.is_empty();
                (inferred, was_inferred)
            }
            None => (Vec::new(), false),
        };

        DaySummary {
            day,
            has_entry,
            bands: self.bands(&tags),
            is_today: date == today,
            is_missed: date < today && !has_entry,
            is_future: date > today,
            inferred,
        }
    }

    fn infer(&self, entry: &JournalEntry) -> Vec<MoodTag> {
        let Some(classifier) = self.classifier else {
            return Vec::new();
        };

        let text = entry.written_texts().collect::<Vec<_>>().join("\n");
        classifier.classify(&text, self.catalog)
    }

    fn bands(&self, tags: &[MoodTag]) -> Vec<Band> {
        let total = tags
            .iter()
            .map(|tag| u32::from(tag.intensity))
            .sum::<u32>();
        if total == 0 {
            return Vec::new();
        }

        tags.iter()
            .map(|tag| {
                let base_color = self.catalog.color_for(&tag.mood);
                Band {
                    mood: tag.mood.word.clone(),
                    color: shade(&base_color, tag.intensity).to_string(),
                    base_color,
                    intensity: tag.intensity,
                    pct: f64::from(tag.intensity) / f64::from(total) * 100.0,
                }
            })
            .collect()
    }
}

/// Seven-column text grid, Sunday first.
pub fn render_grid(calendar: &MonthCalendar) -> String {
    let title = NaiveDate::from_ymd_opt(calendar.year, calendar.month.saturating_add(1), 1)
        .map(|date| date.format("%B %Y").to_string())
        .unwrap_or_else(|| format!("{}-{:02}", calendar.year, calendar.month.saturating_add(1)));

    let rows = calendar
        .cells
        .chunks(7)
        .map(|week| {
            week.iter()
                .map(|cell| match cell {
                    None => "     ".to_string(),
                    Some(summary) => format!("{:>3}{:<2}", summary.day, day_marker(summary)),
                })
                .collect::<Vec<_>>()
                .join(" ")
                .trim_end()
                .to_string()
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "{title}\n  Su    Mo    Tu    We    Th    Fr    Sa\n{rows}\n\n* written  ~ inferred mood  ! missed  @ today"
    )
}

fn day_marker(summary: &DaySummary) -> &'static str {
    match (summary.is_today, summary.has_entry, summary.inferred, summary.is_missed) {
        (true, true, _, _) => "@*",
        (true, false, _, _) => "@",
        (false, true, true, _) => "~",
        (false, true, false, _) => "*",
        (false, false, _, true) => "!",
        _ => "",
    }
}

#[cfg(test)]
mod tests {
    use super::{CalendarAggregator, render_grid};
    use crate::analyzer::classifier::KeywordRules;
    use crate::journal::catalog::MoodCatalog;
    use crate::journal::{EntryDetail, JournalEntry, MoodTag};
    use chrono::NaiveDate;
    use std::collections::HashMap;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn entry(catalog: &MoodCatalog, on: NaiveDate, moods: &[(&str, i64)]) -> JournalEntry {
        let tags = moods
            .iter()
            .map(|(id, intensity)| {
                MoodTag::new(catalog.get(id).expect("known mood").clone(), *intensity)
            })
            .collect();
        JournalEntry::new(on, Vec::new(), tags)
    }

    #[test]
    fn grid_has_leading_blanks_and_one_cell_per_day() {
        let catalog = MoodCatalog::default();
        let calendar = CalendarAggregator::new(&catalog).aggregate_month(&[], 2024, 1, date(2024, 2, 10));

        // February 2024 starts on a Thursday.
        assert_eq!(calendar.leading_blanks, 4);
        assert_eq!(calendar.cells.len(), 4 + 29);
        assert!(calendar.cells[..4].iter().all(Option::is_none));
        assert!(calendar.cells[4..].iter().all(Option::is_some));
    }

    #[test]
    fn bands_are_proportional_to_intensity() {
        let catalog = MoodCatalog::default();
        let entries = vec![entry(&catalog, date(2024, 3, 5), &[("happy", 3), ("sad", 1)])];
        let calendar =
            CalendarAggregator::new(&catalog).aggregate_month(&entries, 2024, 2, date(2024, 3, 20));
        let days = calendar.days();
        let summary = days.get(&5).expect("day present");

        assert!(summary.has_entry);
        assert_eq!(summary.bands.len(), 2);
        assert_eq!(summary.bands[0].pct, 75.0);
        assert_eq!(summary.bands[0].color, "#16a34a");
        assert_eq!(summary.bands[1].pct, 25.0);
        let total = summary.bands.iter().map(|band| band.pct).sum::<f64>();
        assert!((total - 100.0).abs() < 1e-9);
    }

    #[test]
    fn missed_only_for_past_days_without_entries() {
        let catalog = MoodCatalog::default();
        let entries = vec![entry(&catalog, date(2024, 3, 2), &[])];
        let calendar =
            CalendarAggregator::new(&catalog).aggregate_month(&entries, 2024, 2, date(2024, 3, 4));
        let days = calendar.days();

        assert!(days[&1].is_missed);
        assert!(!days[&2].is_missed);
        assert!(days[&2].has_entry);
        assert!(days[&2].bands.is_empty());
        assert!(days[&3].is_missed);
        assert!(days[&4].is_today);
        assert!(!days[&4].is_missed);
        assert!(days[&5].is_future);
        assert!(!days[&5].is_missed);
    }

    #[test]
    fn unparsable_dates_and_other_months_are_skipped() {
        let catalog = MoodCatalog::default();
        let mut broken = entry(&catalog, date(2024, 3, 2), &[("happy", 2)]);
        broken.date = "not-a-date".to_string();
        let entries = vec![broken, entry(&catalog, date(2024, 4, 2), &[("happy", 2)])];

        let calendar =
            CalendarAggregator::new(&catalog).aggregate_month(&entries, 2024, 2, date(2024, 5, 1));
        assert!(calendar.days().values().all(|summary| !summary.has_entry));
    }

    #[test]
    fn invalid_month_yields_empty_grid() {
        let catalog = MoodCatalog::default();
        let calendar = CalendarAggregator::new(&catalog).aggregate_month(&[], 2024, 12, date(2024, 1, 1));
        assert!(calendar.cells.is_empty());
    }

    #[test]
    fn classifier_fills_untagged_entries() {
        let catalog = MoodCatalog::default();
        let rules = KeywordRules {
            keywords: HashMap::from([("happy".to_string(), "happy".to_string())]),
        };
        let text_only = JournalEntry::new(
            date(2024, 3, 2),
            vec![
                EntryDetail {
                    prompt_id: "grateful".to_string(),
                    entry_text: "A happy walk".to_string(),
                },
                EntryDetail::skipped("reflection", "sad to skip"),
            ],
            Vec::new(),
        );

        let calendar = CalendarAggregator::new(&catalog)
            .with_classifier(&rules)
            .aggregate_month(&[text_only], 2024, 2, date(2024, 3, 4));
        let days = calendar.days();

        assert!(days[&2].inferred);
        assert_eq!(days[&2].bands.len(), 1);
        assert_eq!(days[&2].bands[0].pct, 100.0);
    }

    #[test]
    fn catalog_color_overrides_embedded_color() {
        let mut catalog = MoodCatalog::default();
        let entries = vec![entry(&catalog, date(2024, 3, 5), &[("happy", 1)])];
        catalog.edit("happy", None, Some("orange")).expect("edit ok");

        let calendar =
            CalendarAggregator::new(&catalog).aggregate_month(&entries, 2024, 2, date(2024, 3, 5));
        let days = calendar.days();
        assert_eq!(days[&5].bands[0].base_color, "orange");
        assert!(days[&5].css_gradient().expect("gradient").contains("#fed7aa 0.0% 100.0%"));
    }

    #[test]
    fn aggregation_is_repeatable() {
        let catalog = MoodCatalog::default();
        let entries = vec![entry(&catalog, date(2024, 3, 5), &[("calm", 2)])];
        let aggregator = CalendarAggregator::new(&catalog);

        let first = aggregator.aggregate_month(&entries, 2024, 2, date(2024, 3, 9));
        let second = aggregator.aggregate_month(&entries, 2024, 2, date(2024, 3, 9));
        assert_eq!(first, second);
        assert!(render_grid(&first).starts_with("March 2024"));
    }
}
