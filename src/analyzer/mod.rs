pub mod calendar;
pub mod classifier;
pub mod dates;
pub mod report;

use crate::analyzer::calendar::{CalendarAggregator, MonthCalendar};
use crate::analyzer::classifier::KeywordRules;
use crate::analyzer::report::{Report, ReportPeriod, SavedReport};
use crate::config::Config;
use crate::db::Database;
use crate::store::JournalStore;
use anyhow::Result;
use chrono::{NaiveDate, Utc};
use tracing::{info, warn};

pub fn open_store(config: &Config) -> Result<JournalStore<Database>> {
    JournalStore::open(Database::open(&config.db_path)?, config.unique_mood_colors)
}

/// Keyword rules are optional; a missing or broken file only disables inference.
pub fn load_classifier(config: &Config) -> Option<KeywordRules> {
    match KeywordRules::load(&config.keywords_path) {
        Ok(rules) => Some(rules),
        Err(error) => {
            warn!(error = %error, "mood inference disabled");
            None
        }
    }
}

/// `month` is zero-based.
pub fn month_calendar(
    config: &Config,
    year: i32,
    month: u32,
    today: NaiveDate,
) -> Result<MonthCalendar> {
    let store = open_store(config)?;
    let rules = load_classifier(config);

    let aggregator = match &rules {
        Some(rules) => CalendarAggregator::new(store.catalog()).with_classifier(rules),
        None => CalendarAggregator::new(store.catalog()),
    };

    Ok(aggregator.aggregate_month(store.entries(), year, month, today))
}

pub fn period_report(config: &Config, period: ReportPeriod, today: NaiveDate) -> Result<Report> {
    let store = open_store(config)?;
    Ok(report::build_report(
        store.entries(),
        period,
        today,
        config.streak_policy(),
    ))
}

pub fn generate_and_store_report(
    config: &Config,
    period: ReportPeriod,
    today: NaiveDate,
) -> Result<(Report, SavedReport)> {
    let store = open_store(config)?;
    let report = report::build_report(store.entries(), period, today, config.streak_policy());
    let saved = report::save_report_files(&report, &config.report_dir, today)?;

    store.repository().upsert_report_meta(
        &report.file_stem(),
        &report.period,
        &report.start,
        Utc::now().timestamp(),
        &saved.markdown_path.display().to_string(),
        &saved.json_path.display().to_string(),
    )?;

    info!(
        period = %report.period,
        start = %report.start,
        entries = report.entry_count,
        "report stored"
    );

    Ok((report, saved))
}

#[cfg(test)]
mod tests {
    use super::{generate_and_store_report, month_calendar, open_store, period_report};
    use crate::analyzer::report::ReportPeriod;
    use crate::config::Config;
    use crate::journal::{EntryDetail, JournalEntry};
    use chrono::{Days, Local, NaiveDate};

    fn temp_config(dir: &tempfile::TempDir) -> Config {
        Config {
            db_path: dir.path().join("db").join("journal.db"),
            report_dir: dir.path().join("reports"),
            keywords_path: dir.path().join("keywords.json"),
            ..Config::default()
        }
    }

    #[test]
    fn stored_report_is_indexed_by_period_and_start() {
        let dir = tempfile::tempdir().expect("temp dir");
        let config = temp_config(&dir);
        let today = NaiveDate::from_ymd_opt(2024, 1, 17).expect("valid date");

        let mut store = open_store(&config).expect("store");
        store
            .save_entry(JournalEntry::new(today, Vec::new(), Vec::new()))
            .expect("saved");
        drop(store);

        let (report, saved) =
            generate_and_store_report(&config, ReportPeriod::Weekly, today).expect("report");
        assert_eq!(report.entry_count, 1);
        assert!(saved.markdown_path.exists());

        let store = open_store(&config).expect("store");
        let meta = store
            .repository()
            .report_meta("weekly-2024-01-14")
            .expect("query")
            .expect("meta stored");
        assert_eq!(meta.period, "weekly");
    }

    #[test]
    fn daily_report_for_a_past_day_shows_todays_streak() {
        let dir = tempfile::tempdir().expect("temp dir");
        let config = temp_config(&dir);
        let today = Local::now().date_naive();
        let two_days_ago = today.checked_sub_days(Days::new(2)).expect("valid date");

        let mut store = open_store(&config).expect("store");
        for back in 0..3 {
            let day = today.checked_sub_days(Days::new(back)).expect("valid date");
            store
                .save_entry(JournalEntry::new(day, Vec::new(), Vec::new()))
                .expect("saved");
        }
        drop(store);

        let period = ReportPeriod::parse("daily", Some(two_days_ago), today).expect("period");
        let report = period_report(&config, period, today).expect("report");
        assert_eq!(report.entry_count, 1);
        assert_eq!(report.start, two_days_ago.format("%Y-%m-%d").to_string());
        assert_eq!(report.streak, 3);
    }

    #[test]
    fn calendar_infers_moods_when_rules_exist() {
        let dir = tempfile::tempdir().expect("temp dir");
        let config = temp_config(&dir);
        std::fs::write(&config.keywords_path, r#"{"keywords":{"sunny":"happy"}}"#)
            .expect("rules written");
        let day = NaiveDate::from_ymd_opt(2024, 3, 5).expect("valid date");

        let mut store = open_store(&config).expect("store");
        store
            .save_entry(JournalEntry::new(
                day,
                vec![EntryDetail {
                    prompt_id: "grateful".to_string(),
                    entry_text: "a sunny walk".to_string(),
                }],
                Vec::new(),
            ))
            .expect("saved");
        drop(store);

        let calendar = month_calendar(&config, 2024, 2, day).expect("calendar");
        let days = calendar.days();
        let summary = days.get(&5).expect("day present");
        assert!(summary.inferred);
        assert_eq!(summary.bands[0].mood, "Happy");
    }
}
