use crate::journal::catalog::MoodCatalog;
use crate::journal::{MoodTag, clamp_intensity};
use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

static WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\p{L}\p{N}']+").expect("valid regex"));

/// Infers mood tags from free text for entries that carry none.
pub trait MoodClassifier {
    fn classify(&self, text: &str, catalog: &MoodCatalog) -> Vec<MoodTag>;
}

pub fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    WORD.find_iter(text)
        .map(|token| token.as_str().trim_matches('\'').to_lowercase())
        .filter(|token| !token.is_empty())
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeywordRules {
    pub keywords: HashMap<String, String>,
}

impl KeywordRules {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read keyword rules: {}", path.display()))?;
        let parsed: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse keyword rules: {}", path.display()))?;

        Ok(parsed.normalized())
    }

    fn mood_for(&self, token: &str) -> Option<&str> {
        self.keywords.get(token).map(String::as_str).or_else(|| {
            // Inflected forms such as "stressful" or "happiest".
            self.keywords
                .iter()
                .filter(|(keyword, _)| keyword.len() > 3 && token.starts_with(keyword.as_str()))
                .max_by_key(|(keyword, _)| keyword.len())
                .map(|(_, mood)| mood.as_str())
        })
    }

    fn normalized(self) -> Self {
        let keywords = self
            .keywords
            .into_iter()
            .map(|(keyword, mood)| (keyword.trim().to_lowercase(), mood.trim().to_lowercase()))
            .filter(|(keyword, mood)| !keyword.is_empty() && !mood.is_empty())
            .collect::<HashMap<_, _>>();

        Self { keywords }
    }
}

impl MoodClassifier for KeywordRules {
    fn classify(&self, text: &str, catalog: &MoodCatalog) -> Vec<MoodTag> {
        let mut order: Vec<String> = Vec::new();
        let mut hits: HashMap<String, i64> = HashMap::new();

        for token in tokenize(text) {
            let Some(mood_id) = self.mood_for(&token) else {
                continue;
            };
            if catalog.get(mood_id).is_none() {
                continue;
            }

            let count = hits.entry(mood_id.to_string()).or_insert(0);
            if *count == 0 {
                order.push(mood_id.to_string());
            }
            *count += 1;
        }

        order
            .into_iter()
            .filter_map(|mood_id| {
                let mood = catalog.get(&mood_id)?.clone();
                let count = hits.get(&mood_id).copied().unwrap_or(1);
                Some(MoodTag {
                    mood,
                    intensity: clamp_intensity(count + 1),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{KeywordRules, MoodClassifier, tokenize};
    use crate::journal::catalog::MoodCatalog;
    use std::collections::HashMap;

    fn rules() -> KeywordRules {
        KeywordRules {
            keywords: HashMap::from([
                ("happy".to_string(), "happy".to_string()),
                ("stress".to_string(), "stressed".to_string()),
                ("sad".to_string(), "sad".to_string()),
                ("zen".to_string(), "unknown-mood".to_string()),
            ]),
        }
    }

    #[test]
    fn tokenize_lowercases_words() {
        let tokens = tokenize("Don't stop, HAPPY-go lucky!").collect::<Vec<_>>();
        assert_eq!(tokens, vec!["don't", "stop", "happy", "go", "lucky"]);
    }

    #[test]
    fn classify_orders_by_first_hit_and_scales_intensity() {
        let catalog = MoodCatalog::default();
        let tags = rules().classify(
            "Stressful morning, then a happy lunch. So happy, happy!",
            &catalog,
        );

        let summary = tags
            .iter()
            .map(|tag| (tag.mood.id.as_str(), tag.intensity))
            .collect::<Vec<_>>();
        assert_eq!(summary, vec![("stressed", 2), ("happy", 4)]);
    }

    #[test]
    fn unknown_catalog_moods_are_ignored() {
        let catalog = MoodCatalog::default();
        assert!(rules().classify("zen and quiet", &catalog).is_empty());
        assert!(rules().classify("", &catalog).is_empty());
    }
}
