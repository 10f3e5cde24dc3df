pub mod catalog;
pub mod prompts;

use crate::analyzer::dates::parse_entry_date;
use anyhow::{Result, bail};
use chrono::{NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

pub const SKIPPED_MARKER: &str = "[Skipped]";
pub const MIN_INTENSITY: u8 = 1;
pub const MAX_INTENSITY: u8 = 4;
pub const DEFAULT_INTENSITY: u8 = 2;
pub const PIN_LENGTH: usize = 4;
pub const PIN_FIELD: &str = "pin";
pub const PIN_ENABLED_FIELD: &str = "pinEnabled";
pub const PIN_MASK: &str = "****";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoodWord {
    pub id: String,
    pub word: String,
    pub base_color: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoodTag {
    pub mood: MoodWord,
    #[serde(default = "default_intensity", deserialize_with = "lenient_intensity")]
    pub intensity: u8,
}

impl MoodTag {
    pub fn new(mood: MoodWord, intensity: i64) -> Self {
        Self {
            mood,
            intensity: clamp_intensity(intensity),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryDetail {
    #[serde(default)]
    pub prompt_id: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub entry_text: String,
}

impl EntryDetail {
    pub fn skip_reason(&self) -> Option<&str> {
        self.entry_text
            .trim_start()
            .strip_prefix(SKIPPED_MARKER)
            .map(str::trim)
    }

    pub fn skipped(prompt_id: &str, phrase: &str) -> Self {
        Self {
            prompt_id: prompt_id.to_string(),
            entry_text: format!("{SKIPPED_MARKER} {}", phrase.trim()),
        }
    }
}

/// One journal submission. `date` keeps the stored text so that malformed
/// rows survive a load and are simply ignored by the aggregates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalEntry {
    #[serde(default, deserialize_with = "lenient_text")]
    pub date: String,
    #[serde(default, deserialize_with = "lenient_seq")]
    pub entry_details: Vec<EntryDetail>,
    #[serde(default, deserialize_with = "lenient_seq")]
    pub moods: Vec<MoodTag>,
    #[serde(default, deserialize_with = "lenient_opt_text")]
    pub timestamp: Option<String>,
}

impl JournalEntry {
    pub fn new(date: NaiveDate, entry_details: Vec<EntryDetail>, moods: Vec<MoodTag>) -> Self {
        Self {
            date: date.format("%Y-%m-%d").to_string(),
            entry_details,
            moods,
            timestamp: Some(Utc::now().to_rfc3339()),
        }
    }

    pub fn day(&self) -> Option<NaiveDate> {
        parse_entry_date(&self.date)
    }

    pub fn average_intensity(&self) -> Option<f64> {
        if self.moods.is_empty() {
            return None;
        }

        let total = self
            .moods
            .iter()
            .map(|tag| f64::from(tag.intensity))
            .sum::<f64>();
        Some(total / self.moods.len() as f64)
    }

    /// Prompt responses that were written, not skipped.
    pub fn written_texts(&self) -> impl Iterator<Item = &str> {
        self.entry_details
            .iter()
            .filter(|detail| detail.skip_reason().is_none())
            .map(|detail| detail.entry_text.as_str())
    }
}

/// Parses a JSON array of entries; anything that is not an array yields
/// nothing and malformed elements are dropped one by one.
pub fn entries_from_value(value: Value) -> Vec<JournalEntry> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserProfile(pub BTreeMap<String, Value>);

impl UserProfile {
    pub const KNOWN_FIELDS: [&'static str; 11] = [
        "firstName",
        "lastName",
        "nickname",
        "dob",
        "email",
        "phoneNumber",
        "bio",
        "theme",
        "font",
        PIN_FIELD,
        PIN_ENABLED_FIELD,
    ];

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn with_value(mut self, key: &str, value: &str) -> Self {
        let parsed = match value.trim() {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => Value::String(value.to_string()),
        };
        self.0.insert(key.to_string(), parsed);
        self
    }

    /// Like `with_value`, but the lock fields are validated. Setting a PIN
    /// turns the lock on; enabling the lock needs a stored PIN.
    pub fn set_field(self, key: &str, value: &str) -> Result<Self> {
        match key {
            PIN_FIELD => {
                let pin = validate_pin(value)?;
                let mut profile = self;
                profile.0.insert(PIN_FIELD.to_string(), Value::String(pin));
                profile.0.insert(PIN_ENABLED_FIELD.to_string(), Value::Bool(true));
                Ok(profile)
            }
            PIN_ENABLED_FIELD => {
                let profile = self.with_value(key, value);
                profile.validate()?;
                Ok(profile)
            }
            _ => Ok(self.with_value(key, value)),
        }
    }

    pub fn pin(&self) -> Option<&str> {
        self.0.get(PIN_FIELD).and_then(Value::as_str)
    }

    pub fn pin_required(&self) -> bool {
        self.0.get(PIN_ENABLED_FIELD).and_then(Value::as_bool) == Some(true)
            && self.pin().is_some()
    }

    pub fn check_pin(&self, attempt: &str) -> Result<()> {
        match self.pin() {
            Some(pin) if pin != attempt.trim() => bail!("Incorrect PIN. Please try again."),
            _ => Ok(()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self.0.get(PIN_ENABLED_FIELD) {
            None | Some(Value::Bool(_)) => {}
            Some(other) => bail!("{PIN_ENABLED_FIELD} must be true or false, got {other}"),
        }
        if let Some(value) = self.0.get(PIN_FIELD) {
            validate_pin(value.as_str().unwrap_or_default())?;
        }
        if self.0.get(PIN_ENABLED_FIELD).and_then(Value::as_bool) == Some(true)
            && self.pin().is_none()
        {
            bail!("Set a {PIN_LENGTH}-digit PIN before enabling the lock");
        }
        Ok(())
    }

    /// Copy safe to print or serve; the PIN is masked.
    pub fn redacted(&self) -> Self {
        let mut profile = self.clone();
        if let Some(pin) = profile.0.get_mut(PIN_FIELD) {
            *pin = Value::String(PIN_MASK.to_string());
        }
        profile
    }

    pub fn display_name(&self) -> Option<String> {
        let text = |key: &str| {
            self.0
                .get(key)
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|value| !value.is_empty())
        };

        text("nickname").map(ToOwned::to_owned).or_else(|| {
            match (text("firstName"), text("lastName")) {
                (Some(first), Some(last)) => Some(format!("{first} {last}")),
                (Some(first), None) => Some(first.to_string()),
                (None, Some(last)) => Some(last.to_string()),
                (None, None) => None,
            }
        })
    }
}

pub fn validate_pin(raw: &str) -> Result<String> {
    let pin = raw.trim();
    if pin.len() != PIN_LENGTH || !pin.chars().all(|c| c.is_ascii_digit()) {
        bail!("PIN must be exactly {PIN_LENGTH} digits");
    }
    Ok(pin.to_string())
}

pub fn clamp_intensity(raw: i64) -> u8 {
    raw.clamp(i64::from(MIN_INTENSITY), i64::from(MAX_INTENSITY)) as u8
}

fn default_intensity() -> u8 {
    DEFAULT_INTENSITY
}

fn lenient_intensity<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let raw = match &value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|float| float.round() as i64)),
        Value::String(text) => text.trim().parse::<i64>().ok(),
        _ => None,
    };

    Ok(raw.map_or(DEFAULT_INTENSITY, clamp_intensity))
}

fn lenient_seq<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    })
}

fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(text) => text,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

fn lenient_opt_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(text) => Some(text),
        _ => None,
    })
}
