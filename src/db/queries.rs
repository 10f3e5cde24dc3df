pub const CREATE_ENTRIES: &str = r#"
CREATE TABLE IF NOT EXISTS entries (
  date        TEXT PRIMARY KEY,
  payload     TEXT NOT NULL,
  updated_at  INTEGER NOT NULL
);
"#;

pub const CREATE_MOOD_WORDS: &str = r#"
CREATE TABLE IF NOT EXISTS mood_words (
  id          TEXT PRIMARY KEY,
  word        TEXT NOT NULL,
  base_color  TEXT NOT NULL,
  position    INTEGER NOT NULL
);
"#;

pub const CREATE_PROFILE: &str = r#"
CREATE TABLE IF NOT EXISTS profile (
  id          INTEGER PRIMARY KEY CHECK (id = 1),
  payload     TEXT NOT NULL,
  updated_at  INTEGER NOT NULL
);
"#;

pub const CREATE_REPORTS: &str = r#"
CREATE TABLE IF NOT EXISTS reports (
  id           INTEGER PRIMARY KEY AUTOINCREMENT,
  report_key   TEXT NOT NULL UNIQUE,
  period       TEXT NOT NULL,
  start_date   TEXT NOT NULL,
  generated_at INTEGER NOT NULL,
  md_path      TEXT NOT NULL,
  json_path    TEXT NOT NULL
);
"#;

pub const INDEX_REPORTS_GENERATED_AT: &str =
    "CREATE INDEX IF NOT EXISTS idx_reports_generated_at ON reports(generated_at);";

pub fn schema_statements() -> Vec<&'static str> {
    vec![
        CREATE_ENTRIES,
        CREATE_MOOD_WORDS,
        CREATE_PROFILE,
        CREATE_REPORTS,
        INDEX_REPORTS_GENERATED_AT,
    ]
}
