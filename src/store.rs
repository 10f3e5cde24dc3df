use crate::journal::catalog::{MoodCatalog, default_mood_words};
use crate::journal::{JournalEntry, MoodWord, UserProfile};
use anyhow::{Result, bail};
use tracing::{debug, info};

/// Persistence port behind [`JournalStore`].
pub trait JournalRepository {
    fn load_entries(&self) -> Result<Vec<JournalEntry>>;
    fn upsert_entry(&mut self, entry: &JournalEntry) -> Result<()>;
    fn delete_entry(&mut self, date: &str) -> Result<bool>;
    fn load_mood_words(&self) -> Result<Vec<MoodWord>>;
    fn save_mood_words(&mut self, words: &[MoodWord]) -> Result<()>;
    fn load_profile(&self) -> Result<UserProfile>;
    fn save_profile(&mut self, profile: &UserProfile) -> Result<()>;
}

pub struct JournalStore<R: JournalRepository> {
    repository: R,
    entries: Vec<JournalEntry>,
    catalog: MoodCatalog,
}

impl<R: JournalRepository> JournalStore<R> {
    pub fn open(mut repository: R, unique_mood_colors: bool) -> Result<Self> {
        let entries = repository.load_entries()?;
        let mut words = repository.load_mood_words()?;

        if words.is_empty() {
            words = default_mood_words();
            repository.save_mood_words(&words)?;
            info!(count = words.len(), "seeded default mood words");
        }

        debug!(entries = entries.len(), moods = words.len(), "journal store opened");

        Ok(Self {
            repository,
            entries,
            catalog: MoodCatalog::new(words, unique_mood_colors),
        })
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub fn entries(&self) -> &[JournalEntry] {
        &self.entries
    }

    pub fn catalog(&self) -> &MoodCatalog {
        &self.catalog
    }

    pub fn entry(&self, date: &str) -> Option<&JournalEntry> {
        self.entries.iter().find(|entry| entry.date == date)
    }

    /// Replaces the entry for the same date, or appends a new one.
    pub fn save_entry(&mut self, entry: JournalEntry) -> Result<()> {
        let Some(day) = entry.day() else {
            bail!("Invalid entry date: {}. Example: 2026-02-18", entry.date);
        };

        let mut entry = entry;
        entry.date = day.format("%Y-%m-%d").to_string();
        self.repository.upsert_entry(&entry)?;

        match self.entries.iter().position(|existing| existing.date == entry.date) {
            Some(index) => {
                debug!(date = %entry.date, "replacing existing entry");
                self.entries[index] = entry;
            }
            None => self.entries.push(entry),
        }

        Ok(())
    }

    pub fn delete_entry(&mut self, date: &str) -> Result<bool> {
        let removed = self.repository.delete_entry(date)?;
        self.entries.retain(|entry| entry.date != date);
        Ok(removed)
    }

    pub fn add_mood_word(&mut self, word: &str, color: &str) -> Result<MoodWord> {
        let added = self.catalog.add(word, color)?.clone();
        self.repository.save_mood_words(self.catalog.words())?;
        Ok(added)
    }

    pub fn edit_mood_word(
        &mut self,
        id: &str,
        word: Option<&str>,
        color: Option<&str>,
    ) -> Result<MoodWord> {
        let edited = self.catalog.edit(id, word, color)?.clone();
        self.repository.save_mood_words(self.catalog.words())?;
        Ok(edited)
    }

    pub fn profile(&self) -> Result<UserProfile> {
        self.repository.load_profile()
    }

    pub fn replace_profile(&mut self, profile: &UserProfile) -> Result<()> {
        self.repository.save_profile(profile)
    }
}

#[cfg(test)]
#[derive(Default)]
pub struct MemoryRepository {
    pub entries: Vec<JournalEntry>,
    pub mood_words: Vec<MoodWord>,
    pub profile: UserProfile,
}

#[cfg(test)]
impl JournalRepository for MemoryRepository {
    fn load_entries(&self) -> Result<Vec<JournalEntry>> {
        Ok(self.entries.clone())
    }

    fn upsert_entry(&mut self, entry: &JournalEntry) -> Result<()> {
        self.entries.retain(|existing| existing.date != entry.date);
        self.entries.push(entry.clone());
        Ok(())
    }

    fn delete_entry(&mut self, date: &str) -> Result<bool> {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.date != date);
        Ok(self.entries.len() != before)
    }

    fn load_mood_words(&self) -> Result<Vec<MoodWord>> {
        Ok(self.mood_words.clone())
    }

    fn save_mood_words(&mut self, words: &[MoodWord]) -> Result<()> {
        self.mood_words = words.to_vec();
        Ok(())
    }

    fn load_profile(&self) -> Result<UserProfile> {
        Ok(self.profile.clone())
    }

    fn save_profile(&mut self, profile: &UserProfile) -> Result<()> {
        self.profile = profile.clone();
        Ok(())
    }
}
