use crate::journal::{MAX_INTENSITY, MIN_INTENSITY, MoodWord};
use anyhow::{Result, bail};

pub const VALID_COLORS: [&str; 13] = [
    "red", "blue", "green", "yellow", "purple", "pink", "teal", "indigo", "orange", "lime",
    "cyan", "emerald", "gray",
];

// Shades 200 / 400 / 600 / 800, indexed by intensity 1..=4.
const SHADES: [(&str, [&str; 4]); 13] = [
    ("red", ["#fecaca", "#f87171", "#dc2626", "#991b1b"]),
    ("blue", ["#bfdbfe", "#60a5fa", "#2563eb", "#1e40af"]),
    ("green", ["#bbf7d0", "#4ade80", "#16a34a", "#166534"]),
    ("yellow", ["#fef08a", "#facc15", "#ca8a04", "#854d0e"]),
    ("purple", ["#e9d5ff", "#c084fc", "#9333ea", "#6b21a8"]),
    ("pink", ["#fbcfe8", "#f472b6", "#db2777", "#9d174d"]),
    ("teal", ["#99f6e4", "#2dd4bf", "#0d9488", "#115e59"]),
    ("indigo", ["#c7d2fe", "#818cf8", "#4f46e5", "#3730a3"]),
    ("orange", ["#fed7aa", "#fb923c", "#ea580c", "#9a3412"]),
    ("lime", ["#d9f99d", "#a3e635", "#65a30d", "#3f6212"]),
    ("cyan", ["#a5f3fc", "#22d3ee", "#0891b2", "#155e75"]),
    ("emerald", ["#a7f3d0", "#34d399", "#059669", "#065f46"]),
    ("gray", ["#e5e7eb", "#9ca3af", "#4b5563", "#1f2937"]),
];

/// Deterministic display color for a base color at a given intensity.
/// Unknown colors render in gray.
pub fn shade(base_color: &str, intensity: u8) -> &'static str {
    let normalized = base_color.trim().to_lowercase();
    let index = usize::from(intensity.clamp(MIN_INTENSITY, MAX_INTENSITY) - 1);

    SHADES
        .iter()
        .find(|(name, _)| *name == normalized)
        .or_else(|| SHADES.iter().find(|(name, _)| *name == "gray"))
        .map(|(_, shades)| shades[index])
        .unwrap_or("#9ca3af")
}

pub fn default_mood_words() -> Vec<MoodWord> {
    [
        ("happy", "Happy", "green"),
        ("calm", "Calm", "blue"),
        ("energetic", "Energetic", "yellow"),
        ("sad", "Sad", "purple"),
        ("stressed", "Stressed", "red"),
        ("excited", "Excited", "pink"),
        ("relaxed", "Relaxed", "teal"),
    ]
    .into_iter()
    .map(|(id, word, base_color)| MoodWord {
        id: id.to_string(),
        word: word.to_string(),
        base_color: base_color.to_string(),
    })
    .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoodCatalog {
    words: Vec<MoodWord>,
    unique_colors: bool,
}

impl Default for MoodCatalog {
    fn default() -> Self {
        Self::new(default_mood_words(), false)
    }
}

impl MoodCatalog {
    pub fn new(words: Vec<MoodWord>, unique_colors: bool) -> Self {
        Self {
            words,
            unique_colors,
        }
    }

    pub fn words(&self) -> &[MoodWord] {
        &self.words
    }

    pub fn get(&self, id: &str) -> Option<&MoodWord> {
        self.words.iter().find(|mood| mood.id == id)
    }

    /// Looks a mood up by id first, then by word (case-insensitive).
    pub fn find(&self, key: &str) -> Option<&MoodWord> {
        let normalized = key.trim().to_lowercase();
        self.get(&normalized).or_else(|| {
            self.words
                .iter()
                .find(|mood| mood.word.to_lowercase() == normalized)
        })
    }

    pub fn color_for(&self, mood: &MoodWord) -> String {
        self.get(&mood.id)
            .map(|known| known.base_color.clone())
            .unwrap_or_else(|| mood.base_color.clone())
    }

    pub fn add(&mut self, word: &str, color: &str) -> Result<&MoodWord> {
        let word = word.trim();
        let color = color.trim().to_lowercase();

        if word.is_empty() || color.is_empty() {
            bail!("Both word and color are required");
        }

        self.validate(None, word, &color)?;

        let id = mood_id(word);
        if self.get(&id).is_some() {
            bail!("Mood id already exists: {id}");
        }

        self.words.push(MoodWord {
            id,
            word: word.to_string(),
            base_color: color,
        });

        Ok(&self.words[self.words.len() - 1])
    }

    pub fn edit(&mut self, id: &str, word: Option<&str>, color: Option<&str>) -> Result<&MoodWord> {
        let index = self
            .words
            .iter()
            .position(|mood| mood.id == id)
            .ok_or_else(|| anyhow::anyhow!("Unknown mood: {id}"))?;

        let current = &self.words[index];
        let word = word
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(current.word.as_str())
            .to_string();
        let color = color
            .map(|value| value.trim().to_lowercase())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| current.base_color.clone());

        self.validate(Some(id), &word, &color)?;

        let mood = &mut self.words[index];
        mood.word = word;
        mood.base_color = color;

        Ok(&self.words[index])
    }

    fn validate(&self, editing: Option<&str>, word: &str, color: &str) -> Result<()> {
        if self.others(editing).any(|mood| mood.word.to_lowercase() == word.to_lowercase()) {
            bail!("This mood word already exists: {word}");
        }

        if self.unique_colors && self.others(editing).any(|mood| mood.base_color == color) {
            bail!("Color {color} is already assigned to another mood word");
        }

        if !VALID_COLORS.contains(&color) {
            bail!(
                "Invalid color: {color}. Supported colors: {}",
                VALID_COLORS.join(", ")
            );
        }

        Ok(())
    }

    fn others<'a>(&'a self, editing: Option<&'a str>) -> impl Iterator<Item = &'a MoodWord> + 'a {
        self.words
            .iter()
            .filter(move |mood| Some(mood.id.as_str()) != editing)
    }
}

fn mood_id(word: &str) -> String {
    word.to_lowercase().split_whitespace().collect::<Vec<_>>().join("-")
}

#[cfg(test)]
mod tests {
    use super::{MoodCatalog, default_mood_words, shade};

    #[test]
    fn shade_follows_intensity_and_falls_back_to_gray() {
        assert_eq!(shade("green", 1), "#bbf7d0");
        assert_eq!(shade("Green", 4), "#166534");
        assert_eq!(shade("green", 9), "#166534");
        assert_eq!(shade("chartreuse", 2), "#9ca3af");
    }

    #[test]
    fn add_builds_id_from_word() {
        let mut catalog = MoodCatalog::default();
        let added = catalog.add("Quietly Proud", "indigo").expect("mood added");

        assert_eq!(added.id, "quietly-proud");
        assert_eq!(added.base_color, "indigo");
        assert_eq!(catalog.words().len(), default_mood_words().len() + 1);
    }

    #[test]
    fn add_rejects_duplicates_and_invalid_colors() {
        let mut catalog = MoodCatalog::default();

        assert!(catalog.add("happy", "orange").is_err());
        assert!(catalog.add("Joyful", "rgb(1,2,3)").is_err());
        assert!(catalog.add("", "red").is_err());
        assert!(catalog.add("Joyful", "green").is_ok());
    }

    #[test]
    fn unique_colors_is_opt_in() {
        let mut catalog = MoodCatalog::new(default_mood_words(), true);
        assert!(catalog.add("Joyful", "green").is_err());
        assert!(catalog.add("Joyful", "lime").is_ok());
    }

    #[test]
    fn edit_keeps_own_word_and_checks_others() {
        let mut catalog = MoodCatalog::default();

        let edited = catalog.edit("happy", None, Some("lime")).expect("edit ok");
        assert_eq!(edited.word, "Happy");
        assert_eq!(edited.base_color, "lime");

        assert!(catalog.edit("happy", Some("Calm"), None).is_err());
        assert!(catalog.edit("missing", Some("x"), None).is_err());
    }

    #[test]
    fn find_matches_id_or_word() {
        let catalog = MoodCatalog::default();
        assert_eq!(catalog.find("Stressed").map(|mood| mood.id.as_str()), Some("stressed"));
        assert!(catalog.find("bored").is_none());
    }
}
