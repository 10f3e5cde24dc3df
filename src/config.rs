use crate::analyzer::report::StreakPolicy;
use anyhow::{Context, Result, anyhow, bail};
use chrono::NaiveTime;
use dirs::home_dir;
use serde::{Deserialize, Serialize};
use std::fs;
#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

const APP_DIR: &str = ".moodlog";
const CONFIG_FILE: &str = "config.json";
const KEYWORDS_FILE: &str = "keywords.json";
const DEFAULT_REPORT_TIME: &str = "21:00";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub db_path: PathBuf,
    pub report_dir: PathBuf,
    pub keywords_path: PathBuf,
    pub report_time: String,
    pub api_port: u16,
    pub streak_grace_day: bool,
    pub unique_mood_colors: bool,
    pub reminder_enabled: bool,
}

impl Default for Config {
    fn default() -> Self {
        let root = default_root_dir();

        Self {
            db_path: root.join("db").join("journal.db"),
            report_dir: default_report_dir(),
            keywords_path: root.join(KEYWORDS_FILE),
            report_time: DEFAULT_REPORT_TIME.to_string(),
            api_port: 7891,
            streak_grace_day: true,
            unique_mood_colors: false,
            reminder_enabled: true,
        }
    }
}

impl Config {
    pub fn config_path() -> Result<PathBuf> {
        Ok(default_root_dir().join(CONFIG_FILE))
    }

    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let content = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(&config_path, content)
            .with_context(|| format!("Failed to write config file: {}", config_path.display()))?;
        set_mode_600(&config_path)?;

        Ok(())
    }

    pub fn ensure_bootstrap_files(&self) -> Result<()> {
        let root = default_root_dir();
        fs::create_dir_all(&root)
            .with_context(|| format!("Failed to create root directory: {}", root.display()))?;

        if let Some(parent) = self.db_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create DB directory: {}", parent.display()))?;
        }

        fs::create_dir_all(&self.report_dir).with_context(|| {
            format!(
                "Failed to create report directory: {}",
                self.report_dir.display()
            )
        })?;

        if !self.keywords_path.exists() {
            fs::write(&self.keywords_path, include_str!("../assets/keywords.json")).with_context(
                || {
                    format!(
                        "Failed to create default keyword rules: {}",
                        self.keywords_path.display()
                    )
                },
            )?;
            set_mode_600(&self.keywords_path)?;
        }

        Ok(())
    }

    pub fn parse_report_time(&self) -> Result<NaiveTime> {
        parse_hhmm(&self.report_time)
    }

    pub fn streak_policy(&self) -> StreakPolicy {
        if self.streak_grace_day {
            StreakPolicy::GraceDay
        } else {
            StreakPolicy::TodayOnly
        }
    }

    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        match normalize_config_key(key) {
            "db_path" => {
                self.db_path = expand_home(value.trim());
            }
            "report_dir" => {
                self.report_dir = expand_home(value.trim());
            }
            "keywords_path" => {
                self.keywords_path = expand_home(value.trim());
            }
            "report_time" => {
                parse_hhmm(value)?;
                self.report_time = value.to_string();
            }
            "api_port" => {
                self.api_port = value
                    .parse::<u16>()
                    .map_err(|_| anyhow!("api_port must be a number"))?;
            }
            "streak_grace_day" => {
                self.streak_grace_day = parse_bool("streak_grace_day", value)?;
            }
            "unique_mood_colors" => {
                self.unique_mood_colors = parse_bool("unique_mood_colors", value)?;
            }
            "reminder_enabled" => {
                self.reminder_enabled = parse_bool("reminder_enabled", value)?;
            }
            _ => {
                bail!(
                    "Unsupported config key: {key}. Supported keys: db_path|db.path, report_dir|report.dir, keywords_path|keywords.path, report_time|report.time, api_port|api.port, streak_grace_day|streak.grace_day, unique_mood_colors|moods.unique_colors, reminder_enabled|reminder.enabled"
                );
            }
        }

        Ok(())
    }

    pub fn get_value(&self, key: &str) -> Option<String> {
        match normalize_config_key(key) {
            "db_path" => Some(self.db_path.display().to_string()),
            "report_dir" => Some(self.report_dir.display().to_string()),
            "keywords_path" => Some(self.keywords_path.display().to_string()),
            "report_time" => Some(self.report_time.clone()),
            "api_port" => Some(self.api_port.to_string()),
            "streak_grace_day" => Some(self.streak_grace_day.to_string()),
            "unique_mood_colors" => Some(self.unique_mood_colors.to_string()),
            "reminder_enabled" => Some(self.reminder_enabled.to_string()),
            _ => None,
        }
    }
}

fn normalize_config_key(key: &str) -> &str {
    match key {
        "db_path" | "db.path" => "db_path",
        "report_dir" | "report.dir" => "report_dir",
        "keywords_path" | "keywords.path" => "keywords_path",
        "report_time" | "report.time" => "report_time",
        "api_port" | "api.port" => "api_port",
        "streak_grace_day" | "streak.grace_day" => "streak_grace_day",
        "unique_mood_colors" | "moods.unique_colors" => "unique_mood_colors",
        "reminder_enabled" | "reminder.enabled" => "reminder_enabled",
        _ => key,
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    value
        .trim()
        .parse::<bool>()
        .map_err(|_| anyhow!("{key} must be true/false"))
}

pub fn parse_hhmm(value: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M")
        .with_context(|| format!("Invalid time format: {value}. Example: 21:00 (24-hour format)"))
}

pub fn expand_home(raw: &str) -> PathBuf {
    raw.strip_prefix("~/")
        .and_then(|stripped| home_dir().map(|home| home.join(stripped)))
        .unwrap_or_else(|| PathBuf::from(raw))
}

pub fn default_report_dir() -> PathBuf {
    home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Documents")
        .join("MoodLog")
        .join("reports")
}

fn default_root_dir() -> PathBuf {
    home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

fn set_mode_600(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))
            .with_context(|| format!("Failed to set file permissions: {}", path.display()))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{Config, parse_hhmm};
    use crate::analyzer::report::StreakPolicy;

    #[test]
    fn dotted_aliases_set_the_same_field() {
        let mut config = Config::default();

        config.set_value("streak.grace_day", "false").expect("valid value");
        assert_eq!(config.get_value("streak_grace_day").as_deref(), Some("false"));
        assert_eq!(config.streak_policy(), StreakPolicy::TodayOnly);

        config.set_value("api.port", "8080").expect("valid port");
        assert_eq!(config.api_port, 8080);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let mut config = Config::default();

        assert!(config.set_value("report_time", "25:99").is_err());
        assert!(config.set_value("moods.unique_colors", "sometimes").is_err());
        assert!(config.set_value("theme", "dark").is_err());
        assert!(config.get_value("theme").is_none());
    }

    #[test]
    fn report_time_uses_24_hour_clock() {
        assert!(parse_hhmm("07:05").is_ok());
        assert!(parse_hhmm("7pm").is_err());
    }
}
