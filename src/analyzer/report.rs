use crate::analyzer::classifier::tokenize;
use crate::analyzer::dates::{month_bounds, week_bounds};
use crate::journal::{JournalEntry, MoodTag};
use crate::journal::prompts::{monthly_headline, weekly_headline};
use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

const TOP_KEY_WORDS: usize = 10;
const MIN_KEY_WORD_CHARS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportPeriod {
    Daily(NaiveDate),
    Weekly,
    Monthly,
}

impl ReportPeriod {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Daily(_) => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }

    /// `date` picks the day of a daily report and defaults to `today`.
    /// Weekly and monthly reports always cover the current week or month.
    pub fn parse(label: &str, date: Option<NaiveDate>, today: NaiveDate) -> Result<Self> {
        match (label.trim().to_ascii_lowercase().as_str(), date) {
            ("daily", date) => Ok(Self::Daily(date.unwrap_or(today))),
            ("weekly" | "monthly", Some(_)) => {
                bail!("A report date applies to daily reports only")
            }
            ("weekly", None) => Ok(Self::Weekly),
            ("monthly", None) => Ok(Self::Monthly),
            (other, _) => bail!("Unsupported report period: {other}. Use daily, weekly or monthly"),
        }
    }

    /// Inclusive window; weekly and monthly are anchored on `today`.
    /// `None` when the window falls outside the representable date range.
    pub fn window(&self, today: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
        match self {
            Self::Daily(date) => Some((*date, *date)),
            Self::Weekly => week_bounds(today),
            Self::Monthly => month_bounds(today),
        }
    }
}

/// Whether a streak survives a day without an entry yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreakPolicy {
    #[default]
    GraceDay,
    TodayOnly,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendPoint {
    pub date: String,
    pub average_mood: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub name: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub period: String,
    pub start: String,
    pub end: String,
    pub entry_count: usize,
    pub trend: Vec<TrendPoint>,
    pub distribution: Vec<Tally>,
    pub dominant_mood: Option<String>,
    pub streak: u32,
    pub skip_reasons: Vec<Tally>,
    pub key_words: Vec<Tally>,
}

impl Report {
    pub fn dominant_mood_label(&self) -> &str {
        self.dominant_mood.as_deref().unwrap_or("N/A")
    }

    pub fn file_stem(&self) -> String {
        format!("{}-{}", self.period, self.start)
    }
}

#[derive(Debug)]
pub struct SavedReport {
    pub markdown_path: PathBuf,
    pub json_path: PathBuf,
}

pub fn build_report(
    entries: &[JournalEntry],
    period: ReportPeriod,
    today: NaiveDate,
    policy: StreakPolicy,
) -> Report {
    let bounds = period.window(today);
    if bounds.is_none() {
        warn!(period = period.label(), %today, "Report window out of date range; reporting nothing");
    }
    let window = entries
        .iter()
        .filter(|entry| {
            bounds.is_some_and(|(start, end)| {
                entry.day().is_some_and(|date| date >= start && date <= end)
            })
        })
        .collect::<Vec<_>>();

    let distribution = mood_distribution(&window);
    let (start, end) = bounds.unwrap_or((today, today));

    Report {
        period: period.label().to_string(),
        start: start.format("%Y-%m-%d").to_string(),
        end: end.format("%Y-%m-%d").to_string(),
        entry_count: window.len(),
        trend: mood_trend(&window),
        dominant_mood: dominant(&distribution),
        distribution,
        streak: compute_streak(entries, today, policy),
        skip_reasons: skip_reasons(&window),
        key_words: key_words(&window),
    }
}

/// Consecutive days ending today (or yesterday under the grace policy),
/// always over the full history.
pub fn compute_streak(entries: &[JournalEntry], today: NaiveDate, policy: StreakPolicy) -> u32 {
    let dates = entries
        .iter()
        .filter_map(JournalEntry::day)
        .collect::<BTreeSet<_>>();

    let Some(last) = dates.last().copied() else {
        return 0;
    };

    let current = match policy {
        StreakPolicy::GraceDay => last == today || today.pred_opt() == Some(last),
        StreakPolicy::TodayOnly => last == today,
    };
    if !current {
        return 0;
    }

    let mut streak = 0_u32;
    let mut previous: Option<NaiveDate> = None;
    for date in &dates {
        streak = match previous {
            Some(prior) if prior.succ_opt() == Some(*date) => streak + 1,
            _ => 1,
        };
        previous = Some(*date);
    }

    streak
}

fn mood_trend(window: &[&JournalEntry]) -> Vec<TrendPoint> {
    let mut points = window
        .iter()
        .filter_map(|entry| {
            let date = entry.day()?;
            let average_mood = entry.average_intensity()?;
            Some((date, average_mood))
        })
        .collect::<Vec<_>>();

    points.sort_by_key(|(date, _)| *date);
    points
        .into_iter()
        .map(|(date, average_mood)| TrendPoint {
            date: date.format("%Y-%m-%d").to_string(),
            average_mood,
        })
        .collect()
}

// Tagged words are snapshots, so a renamed mood keeps its id. Each group is
// labelled with the word from its most recent entry in the window.
fn mood_distribution(window: &[&JournalEntry]) -> Vec<Tally> {
    let mut latest: HashMap<&str, (Option<NaiveDate>, &str)> = HashMap::new();
    for entry in window {
        let day = entry.day();
        for tag in &entry.moods {
            let word = tag.mood.word.as_str();
            let label = latest.entry(mood_key(tag)).or_insert((day, word));
            if day >= label.0 {
                *label = (day, word);
            }
        }
    }

    let mut tallies = tally_in_order(
        window
            .iter()
            .flat_map(|entry| entry.moods.iter())
            .map(|tag| mood_key(tag).to_string()),
    );
    for tally in &mut tallies {
        if let Some((_, word)) = latest.get(tally.name.as_str()) {
            tally.name = (*word).to_string();
        }
    }
    tallies
}

fn mood_key(tag: &MoodTag) -> &str {
    if tag.mood.id.is_empty() {
        &tag.mood.word
    } else {
        &tag.mood.id
    }
}

// Strictly greater keeps the first-encountered mood on ties.
fn dominant(distribution: &[Tally]) -> Option<String> {
    distribution
        .iter()
        .fold(None::<&Tally>, |best, tally| match best {
            Some(current) if current.count >= tally.count => Some(current),
            _ => Some(tally),
        })
        .map(|tally| tally.name.clone())
}

fn skip_reasons(window: &[&JournalEntry]) -> Vec<Tally> {
    let mut reasons = tally_in_order(
        window
            .iter()
            .flat_map(|entry| entry.entry_details.iter())
            .filter_map(|detail| detail.skip_reason())
            .filter(|reason| !reason.is_empty())
            .map(ToOwned::to_owned),
    );

    reasons.sort_by(|left, right| right.count.cmp(&left.count));
    reasons
}

fn key_words(window: &[&JournalEntry]) -> Vec<Tally> {
    let counts = window
        .iter()
        .flat_map(|entry| entry.written_texts())
        .flat_map(tokenize)
        .filter(|token| token.chars().count() >= MIN_KEY_WORD_CHARS)
        .fold(HashMap::new(), |mut acc, token| {
            *acc.entry(token).or_insert(0_u64) += 1;
            acc
        });

    top_n(counts, TOP_KEY_WORDS)
}

fn tally_in_order(items: impl Iterator<Item = String>) -> Vec<Tally> {
    let mut tallies: Vec<Tally> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for item in items {
        match index.get(&item) {
            Some(position) => tallies[*position].count += 1,
            None => {
                index.insert(item.clone(), tallies.len());
                tallies.push(Tally {
                    name: item,
                    count: 1,
                });
            }
        }
    }

    tallies
}

fn top_n(source: HashMap<String, u64>, n: usize) -> Vec<Tally> {
    let mut items = source
        .into_iter()
        .map(|(name, count)| Tally { name, count })
        .collect::<Vec<_>>();

    items.sort_by(|left, right| {
        right
            .count
            .cmp(&left.count)
            .then_with(|| left.name.cmp(&right.name))
    });
    items.into_iter().take(n).collect()
}

pub fn render_markdown(report: &Report, today: NaiveDate) -> String {
    let headline = match report.period.as_str() {
        "weekly" => weekly_headline(today),
        "monthly" => monthly_headline(today),
        _ => "Your day at a glance:",
    };
    let window = if report.start == report.end {
        report.start.clone()
    } else {
        format!("{} ~ {}", report.start, report.end)
    };

    let trend_rows = if report.trend.is_empty() {
        "- No mood data".to_string()
    } else {
        report
            .trend
            .iter()
            .map(|point| format!("| {} | {:.2} |", point.date, point.average_mood))
            .collect::<Vec<_>>()
            .join("\n")
    };

    let distribution_rows = list_tallies(&report.distribution, "- No moods tagged");
    let reason_rows = list_tallies(&report.skip_reasons, "- No skipped prompts");
    let word_rows = list_tallies(&report.key_words, "- No data");
    let streak = match report.streak {
        1 => "1 day".to_string(),
        days => format!("{days} days"),
    };

    format!(
        "# Mood Report ({}) - {}\n\n{}\n\n## Summary\n- Entries: {}\n- Dominant mood: {}\n- Journaling streak: {}\n\n## Mood Trend\n| Date | Average mood (1-4) |\n|------|--------------------|\n{}\n\n## Mood Distribution\n{}\n\n## Common Skip Reasons\n{}\n\n## Key Words (10)\n{}\n",
        report.period,
        window,
        headline,
        report.entry_count,
        report.dominant_mood_label(),
        streak,
        trend_rows,
        distribution_rows,
        reason_rows,
        word_rows
    )
}

pub fn save_report_files(report: &Report, report_dir: &Path, today: NaiveDate) -> Result<SavedReport> {
    fs::create_dir_all(report_dir).with_context(|| {
        format!(
            "Failed to create report directory: {}",
            report_dir.display()
        )
    })?;

    let stem = report.file_stem();
    let markdown_path = report_dir.join(format!("{stem}.md"));
    let json_path = report_dir.join(format!("{stem}.json"));

    fs::write(&markdown_path, render_markdown(report, today)).with_context(|| {
        format!(
            "Failed to write Markdown report: {}",
            markdown_path.display()
        )
    })?;

    let json_content =
        serde_json::to_string_pretty(report).context("Failed to serialize report JSON")?;
    fs::write(&json_path, json_content)
        .with_context(|| format!("Failed to write JSON report: {}", json_path.display()))?;

    Ok(SavedReport {
        markdown_path,
        json_path,
    })
}

fn list_tallies(tallies: &[Tally], empty: &str) -> String {
    if tallies.is_empty() {
        return empty.to_string();
    }

    tallies
        .iter()
        .enumerate()
        .map(|(index, tally)| format!("{}. {} ({})", index + 1, tally.name, tally.count))
        .collect::<Vec<_>>()
        .join("\n")
}
