mod analyzer;
mod api;
mod cli;
mod config;
mod db;
mod journal;
mod scheduler;
mod store;

use crate::analyzer::calendar::render_grid;
use crate::analyzer::report::{ReportPeriod, compute_streak, render_markdown};
use crate::analyzer::{generate_and_store_report, month_calendar, open_store, period_report};
use crate::cli::entry::{parse_mood_spec, parse_prompt_pair, run_interactive_entry};
use crate::cli::lock::unlock;
use crate::cli::onboard::run_onboarding;
use crate::cli::{
    Cli, Commands, ConfigCommands, EntryCommands, MoodCommands, PeriodArg, ProfileCommands,
};
use crate::config::{Config, parse_hhmm};
use crate::db::Database;
use crate::journal::prompts::{post_entry_feedback, reminder};
use crate::journal::{
    EntryDetail, JournalEntry, PIN_ENABLED_FIELD, PIN_FIELD, entries_from_value,
};
use anyhow::{Context, Result, bail};
use chrono::{Datelike, Local, NaiveDate};
use clap::Parser;
use serde_json::Value;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Onboard => {
            let _ = run_onboarding()?;
            Ok(())
        }
        Commands::Config { command } => handle_config_command(command),
        Commands::Status => handle_status(),
        Commands::Doctor => handle_doctor(),
        Commands::Entry { command } => handle_entry_command(command),
        Commands::Mood { command } => handle_mood_command(command),
        Commands::Profile { command } => handle_profile_command(command),
        Commands::Calendar { month } => handle_calendar(month),
        Commands::Report { period, date, save } => handle_report(period, date, save),
        Commands::Serve => {
            let config = load_config()?;
            run_service(config).await
        }
    }
}

fn handle_config_command(command: ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Set { key, value } => {
            let mut config = load_or_default_config()?;
            config.set_value(&key, &value)?;
            config.ensure_bootstrap_files()?;
            config.save()?;

            println!("Config saved: {key} = {value}");
            Ok(())
        }
        ConfigCommands::Get { key } => {
            let config = load_config()?;
            let value = config
                .get_value(&key)
                .with_context(|| format!("Unsupported config key: {key}"))?;

            println!("{value}");
            Ok(())
        }
    }
}

fn handle_status() -> Result<()> {
    let config = load_config()?;
    let store = open_store(&config)?;
    let database = store.repository();
    let today = Local::now().date_naive();

    println!("MoodLog status");
    println!("- entries: {}", database.entry_count()?);
    println!(
        "- latest_entry: {}",
        database
            .latest_entry_date()?
            .unwrap_or_else(|| "none".to_string())
    );
    println!(
        "- streak: {}",
        compute_streak(store.entries(), today, config.streak_policy())
    );
    println!(
        "- written_today: {}",
        store.entry(&today.format("%Y-%m-%d").to_string()).is_some()
    );
    println!(
        "- latest_report: {}",
        database
            .latest_report_meta()?
            .map(|meta| meta.report_key)
            .unwrap_or_else(|| "none".to_string())
    );
    println!("- report_time: {}", config.report_time);

    Ok(())
}

fn handle_doctor() -> Result<()> {
    let config_path = Config::config_path()?;
    let mut issues = Vec::new();

    if config_path.exists() {
        println!("[OK] config.json found: {}", config_path.display());
    } else {
        println!("[WARN] config.json not found: {}", config_path.display());
        issues.push("config missing".to_string());
    }

    let config = load_or_default_config()?;

    match Database::open(&config.db_path) {
        Ok(database) => match database.entry_count() {
            Ok(count) => println!(
                "[OK] SQLite reachable: {} ({count} entries)",
                config.db_path.display()
            ),
            Err(error) => {
                println!("[WARN] SQLite query failed: {error}");
                issues.push("db unreadable".to_string());
            }
        },
        Err(error) => {
            println!("[WARN] SQLite check failed: {error}");
            issues.push("db unreachable".to_string());
        }
    }

    if config.report_dir.exists() {
        println!("[OK] report dir exists: {}", config.report_dir.display());
    } else {
        println!("[WARN] report dir missing: {}", config.report_dir.display());
        issues.push("report dir missing".to_string());
    }

    if let Err(error) = config.parse_report_time() {
        println!("[WARN] invalid report_time setting: {error}");
        issues.push("invalid report_time".to_string());
    } else {
        println!("[OK] report_time format valid: {}", config.report_time);
    }

    match analyzer::classifier::KeywordRules::load(&config.keywords_path) {
        Ok(rules) => println!(
            "[OK] keyword rules loaded: {} keywords",
            rules.keywords.len()
        ),
        Err(error) => {
            println!("[WARN] keyword rules unavailable, mood inference disabled: {error}");
            issues.push("keyword rules missing".to_string());
        }
    }

    if issues.is_empty() {
        println!("doctor result: no issues");
    } else {
        println!("doctor result: {} warning(s)", issues.len());
    }

    Ok(())
}

fn handle_entry_command(command: EntryCommands) -> Result<()> {
    let config = load_config()?;
    let mut store = open_store(&config)?;

    match command {
        EntryCommands::Add {
            date,
            moods,
            responses,
            skips,
            interactive,
        } => {
            let day = parse_optional_date(date)?;

            let (details, tags) = if interactive {
                run_interactive_entry(store.catalog())?
            } else {
                let mut details = responses
                    .iter()
                    .map(|raw| {
                        parse_prompt_pair(raw).map(|(prompt_id, entry_text)| EntryDetail {
                            prompt_id,
                            entry_text,
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                for raw in &skips {
                    let (prompt_id, phrase) = parse_prompt_pair(raw)?;
                    details.push(EntryDetail::skipped(&prompt_id, &phrase));
                }

                let tags = moods
                    .iter()
                    .map(|raw| parse_mood_spec(store.catalog(), raw))
                    .collect::<Result<Vec<_>>>()?;
                (details, tags)
            };

            if details.is_empty() && tags.is_empty() {
                bail!("Nothing to save. Pass --mood/--response/--skip or use --interactive");
            }

            let replacing = store
                .entry(&day.format("%Y-%m-%d").to_string())
                .is_some();
            store.save_entry(JournalEntry::new(day, details, tags))?;

            if replacing {
                println!("Entry for {day} replaced.");
            }
            println!("{}", post_entry_feedback(day));
            Ok(())
        }
        EntryCommands::Show { date } => {
            unlock(&store.profile()?)?;
            let day = parse_date(&date)?;
            let entry = store
                .entry(&day.format("%Y-%m-%d").to_string())
                .with_context(|| format!("No entry for date: {day}"))?;

            println!(
                "{}",
                serde_json::to_string_pretty(entry).context("Failed to serialize entry")?
            );
            Ok(())
        }
        EntryCommands::List { limit } => {
            unlock(&store.profile()?)?;
            let mut entries = store.entries().iter().collect::<Vec<_>>();
            entries.sort_by(|left, right| right.date.cmp(&left.date));

            if entries.is_empty() {
                println!("No entries yet.");
            }
            for entry in entries.into_iter().take(limit) {
                let moods = entry
                    .moods
                    .iter()
                    .map(|tag| format!("{}({})", tag.mood.word, tag.intensity))
                    .collect::<Vec<_>>();
                let skipped = entry
                    .entry_details
                    .iter()
                    .filter(|detail| detail.skip_reason().is_some())
                    .count();

                println!(
                    "{}  moods: {}  answers: {}  skipped: {}",
                    entry.date,
                    if moods.is_empty() {
                        "-".to_string()
                    } else {
                        moods.join(", ")
                    },
                    entry.entry_details.len() - skipped,
                    skipped
                );
            }
            Ok(())
        }
        EntryCommands::Delete { date } => {
            let day = parse_date(&date)?;
            if store.delete_entry(&day.format("%Y-%m-%d").to_string())? {
                println!("Entry deleted: {day}");
            } else {
                println!("No entry for date: {day}");
            }
            Ok(())
        }
        EntryCommands::Import { path } => {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read import file: {}", path.display()))?;
            let value: Value = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse import file: {}", path.display()))?;

            let mut imported = 0_usize;
            for entry in entries_from_value(value) {
                let date = entry.date.clone();
                match store.save_entry(entry) {
                    Ok(()) => imported += 1,
                    Err(error) => warn!(date = %date, error = %error, "skipping imported entry"),
                }
            }

            println!("Imported {imported} entries from {}", path.display());
            Ok(())
        }
        EntryCommands::Export { path } => {
            unlock(&store.profile()?)?;
            export_entries(store.entries(), &path)?;
            println!(
                "Exported {} entries to {}",
                store.entries().len(),
                path.display()
            );
            Ok(())
        }
    }
}

fn handle_mood_command(command: MoodCommands) -> Result<()> {
    let config = load_config()?;
    let mut store = open_store(&config)?;

    match command {
        MoodCommands::List => {
            for mood in store.catalog().words() {
                println!("{:<12} {:<12} {}", mood.id, mood.word, mood.base_color);
            }
            Ok(())
        }
        MoodCommands::Add { word, color } => {
            let mood = store.add_mood_word(&word, &color)?;
            println!("Mood added: {} ({}, {})", mood.word, mood.id, mood.base_color);
            Ok(())
        }
        MoodCommands::Edit { id, word, color } => {
            if word.is_none() && color.is_none() {
                bail!("Nothing to change. Pass --word and/or --color");
            }

            let mood = store.edit_mood_word(&id, word.as_deref(), color.as_deref())?;
            println!("Mood updated: {} ({}, {})", mood.word, mood.id, mood.base_color);
            Ok(())
        }
    }
}

fn handle_profile_command(command: ProfileCommands) -> Result<()> {
    let config = load_config()?;
    let mut store = open_store(&config)?;

    match command {
        ProfileCommands::Show => {
            let profile = store.profile()?;
            if let Some(name) = profile.display_name() {
                println!("Hello, {name}!");
            }
            println!(
                "{}",
                serde_json::to_string_pretty(&profile.redacted())
                    .context("Failed to serialize profile")?
            );
            Ok(())
        }
        ProfileCommands::Set { key, value } => {
            let current = store.profile()?;
            if key == PIN_FIELD || key == PIN_ENABLED_FIELD {
                unlock(&current)?;
            }
            let previous = current
                .redacted()
                .get(&key)
                .map(ToString::to_string);
            let profile = current.set_field(&key, &value)?;
            store.replace_profile(&profile)?;

            if !journal::UserProfile::KNOWN_FIELDS.contains(&key.as_str()) {
                info!(key = %key, "stored custom profile field");
            }
            if key == PIN_FIELD {
                println!("PIN saved. Entries now need the PIN to view or export.");
                return Ok(());
            }
            match previous {
                Some(previous) => println!("Profile saved: {key} = {value} (was {previous})"),
                None => println!("Profile saved: {key} = {value}"),
            }
            Ok(())
        }
    }
}

fn handle_calendar(month: Option<String>) -> Result<()> {
    let config = load_config()?;
    let today = Local::now().date_naive();
    let (year, month) = match month {
        Some(raw) => parse_year_month(&raw)?,
        None => (today.year(), today.month()),
    };

    let calendar = month_calendar(&config, year, month - 1, today)?;
    println!("{}", render_grid(&calendar));

    let tagged = calendar
        .days()
        .into_values()
        .filter(|summary| !summary.bands.is_empty())
        .map(|summary| {
            let bands = summary
                .bands
                .iter()
                .map(|band| format!("{} {:.0}% ({})", band.mood, band.pct, band.color))
                .collect::<Vec<_>>();
            format!("{:>4}: {}", summary.day, bands.join(", "))
        })
        .collect::<Vec<_>>();

    if !tagged.is_empty() {
        println!("\n{}", tagged.join("\n"));
    }

    Ok(())
}

fn handle_report(period: PeriodArg, date: Option<String>, save: bool) -> Result<()> {
    let config = load_config()?;
    let today = Local::now().date_naive();
    let date = date.as_deref().map(parse_date).transpose()?;
    let period = ReportPeriod::parse(period.label(), date, today)?;

    if save {
        let (report, saved) = generate_and_store_report(&config, period, today)?;
        println!("Report generated: {}", report.file_stem());
        println!("- Markdown: {}", saved.markdown_path.display());
        println!("- JSON: {}", saved.json_path.display());
    } else {
        let report = period_report(&config, period, today)?;
        println!("{}", render_markdown(&report, today));
    }

    Ok(())
}

async fn run_service(config: Config) -> Result<()> {
    config.ensure_bootstrap_files()?;
    let _ = open_store(&config)?;

    let shared_config = Arc::new(config);
    let scheduler_config = Arc::clone(&shared_config);
    let scheduler_time_fallback = Arc::clone(&shared_config);
    let api_config = Arc::clone(&shared_config);

    info!("MoodLog service started");

    tokio::select! {
        scheduler_result = scheduler::run_daily_scheduler(move || {
            let report_time = Config::load()
                .map(|runtime| runtime.report_time)
                .unwrap_or_else(|_| scheduler_time_fallback.report_time.clone());

            parse_hhmm(&report_time)
        }, move |date| {
            let config = Arc::clone(&scheduler_config);
            async move {
                let runtime_config = Config::load().unwrap_or_else(|_| (*config).clone());
                run_daily_job(&runtime_config, date)
            }
        }) => {
            scheduler_result?;
        }
        api_result = api::run_server(api_config) => {
            api_result?;
        }
        _ = signal::ctrl_c() => {
            info!("shutdown signal received");
        }
    }

    Ok(())
}

fn run_daily_job(config: &Config, date: NaiveDate) -> Result<()> {
    let (report, saved) = generate_and_store_report(config, ReportPeriod::Daily(date), date)?;
    info!(
        report = %report.file_stem(),
        path = %saved.markdown_path.display(),
        "daily report generated"
    );

    if config.reminder_enabled {
        let store = open_store(config)?;
        if store.entry(&date.format("%Y-%m-%d").to_string()).is_none() {
            info!(date = %date, "{}", reminder(date));
        }
    }

    Ok(())
}

fn export_entries(entries: &[JournalEntry], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create export directory: {}", parent.display()))?;
    }

    let content =
        serde_json::to_string_pretty(entries).context("Failed to serialize entries")?;
    fs::write(path, content)
        .with_context(|| format!("Failed to write export file: {}", path.display()))
}

fn parse_date(input: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .with_context(|| format!("Invalid date format: {input}. Example: 2026-02-18"))
}

fn parse_optional_date(input: Option<String>) -> Result<NaiveDate> {
    input
        .as_deref()
        .map(parse_date)
        .transpose()?
        .map_or_else(|| Ok(Local::now().date_naive()), Ok)
}

/// `YYYY-MM` to a year and a one-based month.
fn parse_year_month(input: &str) -> Result<(i32, u32)> {
    let first = NaiveDate::parse_from_str(&format!("{}-01", input.trim()), "%Y-%m-%d")
        .with_context(|| format!("Invalid month format: {input}. Example: 2026-02"))?;

    Ok((first.year(), first.month()))
}

fn load_or_default_config() -> Result<Config> {
    Config::load().or_else(|_| {
        let config = Config::default();
        config.ensure_bootstrap_files()?;
        config.save()?;
        Ok(config)
    })
}

fn load_config() -> Result<Config> {
    Config::load().with_context(|| "Config file not found. Run `MoodLog onboard` first.".to_string())
}

#[cfg(test)]
mod tests {
    use super::{export_entries, parse_year_month};
    use crate::journal::{JournalEntry, entries_from_value};
    use chrono::NaiveDate;

    #[test]
    fn year_month_accepts_only_valid_months() {
        assert_eq!(parse_year_month("2024-02").expect("valid"), (2024, 2));
        assert!(parse_year_month("2024-13").is_err());
        assert!(parse_year_month("Feb 2024").is_err());
    }

    #[test]
    fn exported_entries_can_be_imported_back() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("backup").join("entries.json");
        let day = NaiveDate::from_ymd_opt(2024, 4, 2).expect("valid date");

        export_entries(&[JournalEntry::new(day, Vec::new(), Vec::new())], &path)
            .expect("exported");

        let content = std::fs::read_to_string(&path).expect("readable");
        let value = serde_json::from_str(&content).expect("json");
        let entries = entries_from_value(value);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].day(), Some(day));
    }
}
