pub mod queries;

use crate::journal::{JournalEntry, MoodWord, UserProfile};
use crate::store::JournalRepository;
use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::warn;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMetaRow {
    pub id: i64,
    pub report_key: String,
    pub period: String,
    pub start_date: String,
    pub generated_at: i64,
    pub md_path: String,
    pub json_path: String,
}

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create DB directory: {}", parent.display()))?;
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open SQLite DB: {}", path.display()))?;

        let database = Self { conn };
        database.init_schema()?;

        Ok(database)
    }

    pub fn init_schema(&self) -> Result<()> {
        queries::schema_statements()
            .iter()
            .try_for_each(|statement| {
                self.conn
                    .execute(statement, [])
                    .context("Failed to initialize schema")
                    .map(|_| ())
            })
    }

    pub fn entry_count(&self) -> Result<i64> {
        self.conn
            .query_row("SELECT COUNT(*) FROM entries", [], |row| row.get(0))
            .context("Failed to count entries")
    }

    pub fn latest_entry_date(&self) -> Result<Option<String>> {
        self.conn
            .query_row(
                "SELECT date FROM entries ORDER BY date DESC LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()
            .context("Failed to query latest entry date")
    }

    pub fn latest_report_meta(&self) -> Result<Option<ReportMetaRow>> {
        self.conn
            .query_row(
                "SELECT id, report_key, period, start_date, generated_at, md_path, json_path
                 FROM reports ORDER BY generated_at DESC LIMIT 1",
                [],
                report_meta_from_row,
            )
            .optional()
            .context("Failed to query latest report")
    }

    pub fn report_meta(&self, report_key: &str) -> Result<Option<ReportMetaRow>> {
        self.conn
            .query_row(
                "SELECT id, report_key, period, start_date, generated_at, md_path, json_path
                 FROM reports WHERE report_key = ?1",
                params![report_key],
                report_meta_from_row,
            )
            .optional()
            .context("Failed to query report")
    }

    pub fn list_reports(&self, limit: usize) -> Result<Vec<ReportMetaRow>> {
        let mut statement = self.conn.prepare(
            "SELECT id, report_key, period, start_date, generated_at, md_path, json_path
             FROM reports
             ORDER BY generated_at DESC
             LIMIT ?1",
        )?;

        let rows = statement
            .query_map(params![limit as i64], report_meta_from_row)?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to list reports")?;

        Ok(rows)
    }

    pub fn upsert_report_meta(
        &self,
        report_key: &str,
        period: &str,
        start_date: &str,
        generated_at: i64,
        md_path: &str,
        json_path: &str,
    ) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO reports (report_key, period, start_date, generated_at, md_path, json_path)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(report_key)
                 DO UPDATE SET generated_at=excluded.generated_at, md_path=excluded.md_path, json_path=excluded.json_path",
                params![report_key, period, start_date, generated_at, md_path, json_path],
            )
            .context("Failed to upsert report metadata")?;

        Ok(())
    }
}

impl JournalRepository for Database {
    fn load_entries(&self) -> Result<Vec<JournalEntry>> {
        let mut statement = self
            .conn
            .prepare("SELECT date, payload FROM entries ORDER BY date ASC")?;

        let rows = statement
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to query entries")?;

        let entries = rows
            .into_iter()
            .filter_map(|(date, payload)| match serde_json::from_str::<JournalEntry>(&payload) {
                Ok(entry) => Some(entry),
                Err(error) => {
                    warn!(date = %date, error = %error, "skipping unreadable entry row");
                    None
                }
            })
            .collect();

        Ok(entries)
    }

    fn upsert_entry(&mut self, entry: &JournalEntry) -> Result<()> {
        let payload = serde_json::to_string(entry).context("Failed to serialize entry")?;
        self.conn
            .execute(
                "INSERT INTO entries (date, payload, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(date) DO UPDATE SET payload=excluded.payload, updated_at=excluded.updated_at",
                params![&entry.date, payload, Utc::now().timestamp()],
            )
            .context("Failed to save entry")?;

        Ok(())
    }

    fn delete_entry(&mut self, date: &str) -> Result<bool> {
        let deleted = self
            .conn
            .execute("DELETE FROM entries WHERE date = ?1", params![date])
            .context("Failed to delete entry")?;

        Ok(deleted > 0)
    }

    fn load_mood_words(&self) -> Result<Vec<MoodWord>> {
        let mut statement = self
            .conn
            .prepare("SELECT id, word, base_color FROM mood_words ORDER BY position ASC")?;

        let rows = statement
            .query_map([], |row| {
                Ok(MoodWord {
                    id: row.get(0)?,
                    word: row.get(1)?,
                    base_color: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to query mood words")?;

        Ok(rows)
    }

    fn save_mood_words(&mut self, words: &[MoodWord]) -> Result<()> {
        let transaction = self
            .conn
            .transaction()
            .context("Failed to start transaction")?;

        transaction
            .execute("DELETE FROM mood_words", [])
            .context("Failed to clear mood words")?;

        words.iter().enumerate().try_for_each(|(position, mood)| {
            transaction
                .execute(
                    "INSERT INTO mood_words (id, word, base_color, position) VALUES (?1, ?2, ?3, ?4)",
                    params![&mood.id, &mood.word, &mood.base_color, position as i64],
                )
                .context("Failed to insert mood word")
                .map(|_| ())
        })?;

        transaction
            .commit()
            .context("Failed to commit mood words")?;
        Ok(())
    }

    fn load_profile(&self) -> Result<UserProfile> {
        let payload: Option<String> = self
            .conn
            .query_row("SELECT payload FROM profile WHERE id = 1", [], |row| row.get(0))
            .optional()
            .context("Failed to query profile")?;

        Ok(payload
            .and_then(|content| match serde_json::from_str(&content) {
                Ok(profile) => Some(profile),
                Err(error) => {
                    warn!(error = %error, "stored profile is unreadable, starting empty");
                    None
                }
            })
            .unwrap_or_default())
    }

    fn save_profile(&mut self, profile: &UserProfile) -> Result<()> {
        let payload = serde_json::to_string(profile).context("Failed to serialize profile")?;
        self.conn
            .execute(
                "INSERT INTO profile (id, payload, updated_at) VALUES (1, ?1, ?2)
                 ON CONFLICT(id) DO UPDATE SET payload=excluded.payload, updated_at=excluded.updated_at",
                params![payload, Utc::now().timestamp()],
            )
            .context("Failed to save profile")?;

        Ok(())
    }
}

fn report_meta_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ReportMetaRow> {
    Ok(ReportMetaRow {
        id: row.get(0)?,
        report_key: row.get(1)?,
        period: row.get(2)?,
        start_date: row.get(3)?,
        generated_at: row.get(4)?,
        md_path: row.get(5)?,
        json_path: row.get(6)?,
    })
}

#[cfg(test)]
mod tests {
    use super::Database;
    use crate::journal::catalog::default_mood_words;
    use crate::journal::{JournalEntry, UserProfile};
    use crate::store::{JournalRepository, JournalStore};
    use chrono::NaiveDate;
    use rusqlite::params;

    fn open_temp() -> (tempfile::TempDir, Database) {
        let dir = tempfile::tempdir().expect("temp dir");
        let database = Database::open(&dir.path().join("db").join("journal.db")).expect("db opens");
        (dir, database)
    }

    #[test]
    fn entries_round_trip_and_upsert_by_date() {
        let (_dir, mut database) = open_temp();
        let day = NaiveDate::from_ymd_opt(2024, 6, 1).expect("valid date");

        database
            .upsert_entry(&JournalEntry::new(day, Vec::new(), Vec::new()))
            .expect("first save");
        database
            .upsert_entry(&JournalEntry::new(day, Vec::new(), Vec::new()))
            .expect("second save");

        assert_eq!(database.entry_count().expect("count"), 1);
        assert_eq!(database.latest_entry_date().expect("latest").as_deref(), Some("2024-06-01"));
        assert!(database.delete_entry("2024-06-01").expect("delete"));
        assert!(database.load_entries().expect("load").is_empty());
    }

    #[test]
    fn unreadable_rows_are_skipped() {
        let (_dir, database) = open_temp();
        database
            .conn
            .execute(
                "INSERT INTO entries (date, payload, updated_at) VALUES (?1, ?2, 0), (?3, ?4, 0)",
                params![
                    "2024-06-01",
                    "{not json",
                    "2024-06-02",
                    r#"{"date":"2024-06-02","moods":"oops"}"#
                ],
            )
            .expect("raw insert");

        let entries = database.load_entries().expect("load");
        assert_eq!(entries.len(), 1);
        assert!(entries[0].moods.is_empty());
    }

    #[test]
    fn mood_words_keep_order_and_profile_is_replaced_wholesale() {
        let (_dir, mut database) = open_temp();
        let mut words = default_mood_words();
        words.reverse();
        database.save_mood_words(&words).expect("save moods");
        assert_eq!(database.load_mood_words().expect("load moods"), words);

        database
            .save_profile(&UserProfile::default().with_value("email", "a@b.c"))
            .expect("save profile");
        database
            .save_profile(&UserProfile::default().with_value("nickname", "Sam"))
            .expect("replace profile");
        let profile = database.load_profile().expect("load profile");
        assert!(profile.get("email").is_none());
        assert_eq!(profile.display_name().as_deref(), Some("Sam"));
    }

    #[test]
    fn store_over_sqlite_seeds_catalog_once() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("journal.db");

        let mut store = JournalStore::open(Database::open(&path).expect("db"), false).expect("store");
        store.add_mood_word("Hopeful", "lime").expect("added");
        drop(store);

        let reopened = JournalStore::open(Database::open(&path).expect("db"), false).expect("store");
        assert_eq!(reopened.catalog().words().len(), 8);
    }

    #[test]
    fn report_meta_upserts_by_key() {
        let (_dir, database) = open_temp();
        database
            .upsert_report_meta("weekly-2024-06-02", "weekly", "2024-06-02", 1, "a.md", "a.json")
            .expect("insert");
        database
            .upsert_report_meta("weekly-2024-06-02", "weekly", "2024-06-02", 2, "b.md", "b.json")
            .expect("update");

        let reports = database.list_reports(10).expect("list");
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].md_path, "b.md");
        assert_eq!(
            database.latest_report_meta().expect("latest").map(|meta| meta.generated_at),
            Some(2)
        );
    }
}
