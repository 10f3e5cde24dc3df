use crate::config::{Config, default_report_dir, expand_home, parse_hhmm};
use crate::db::Database;
use crate::store::JournalStore;
use anyhow::{Context, Result};
use dialoguer::{Confirm, Input, theme::ColorfulTheme};

pub fn run_onboarding() -> Result<Config> {
    println!("──────────────────────────────────────────");
    println!("  Welcome to MoodLog onboarding.");
    println!("──────────────────────────────────────────");

    let theme = ColorfulTheme::default();

    println!("\n[1/5] What should we call you?");
    let nickname: String = Input::with_theme(&theme)
        .with_prompt("  Nickname (leave empty to skip)")
        .allow_empty(true)
        .interact_text()
        .context("Failed to read nickname")?;

    println!("\n[2/5] Daily report and reminder time");
    let report_time: String = Input::with_theme(&theme)
        .with_prompt("  Enter daily report time")
        .default("21:00".to_string())
        .validate_with(|input: &String| -> std::result::Result<(), &str> {
            parse_hhmm(input)
                .map(|_| ())
                .map_err(|_| "Use HH:MM format (example: 21:00)")
        })
        .interact_text()
        .context("Failed to read report time")?;
    println!("  ✓ Reports will be generated daily at {report_time}");

    println!("\n[3/5] Report output directory");
    let default_report_dir = default_report_dir().display().to_string();
    let report_dir_input: String = Input::with_theme(&theme)
        .with_prompt("  Folder where reports will be saved")
        .default(default_report_dir)
        .interact_text()
        .context("Failed to read report directory")?;

    let report_dir = expand_home(&report_dir_input);
    println!("  ✓ {}", report_dir.display());

    println!("\n[4/5] Streak rules");
    let streak_grace_day = Confirm::with_theme(&theme)
        .with_prompt("  Keep your streak alive until you've had a chance to write today?")
        .default(true)
        .interact()
        .context("Failed to read streak rule input")?;

    println!("\n[5/5] Mood colors");
    let unique_mood_colors = Confirm::with_theme(&theme)
        .with_prompt("  Require every mood word to have its own color?")
        .default(false)
        .interact()
        .context("Failed to read mood color input")?;

    let config = Config {
        report_time,
        report_dir,
        streak_grace_day,
        unique_mood_colors,
        ..Config::default()
    };

    config.ensure_bootstrap_files()?;
    config.save()?;

    let mut store = JournalStore::open(Database::open(&config.db_path)?, config.unique_mood_colors)?;
    let nickname = nickname.trim();
    if !nickname.is_empty() {
        let profile = store.profile()?.with_value("nickname", nickname);
        store.replace_profile(&profile)?;
        println!("  ✓ Hi, {nickname}!");
    }

    println!("\n──────────────────────────────────────────");
    println!("  Onboarding complete!");
    println!("  {} mood words are ready.", store.catalog().words().len());
    println!("  Run MoodLog entry add --interactive to write your first entry.");
    println!("──────────────────────────────────────────");

    Ok(config)
}
