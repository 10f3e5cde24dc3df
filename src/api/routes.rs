use crate::analyzer::calendar::DaySummary;
use crate::analyzer::report::{Report, ReportPeriod, compute_streak};
use crate::analyzer::{month_calendar, open_store, period_report};
use crate::config::Config;
use crate::db::ReportMetaRow;
use crate::journal::catalog::shade;
use crate::journal::prompts::{PROMPTS, post_entry_feedback};
use crate::journal::{
    JournalEntry, MAX_INTENSITY, MIN_INTENSITY, PIN_FIELD, PIN_MASK, UserProfile,
};
use anyhow::Context;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, put};
use axum::{Json, Router};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::fs;
use std::sync::Arc;

#[derive(Clone)]
pub struct ApiState {
    pub config: Arc<Config>,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/api/v1/status", get(status))
        .route("/api/v1/entries", get(entries_list).put(entry_put))
        .route("/api/v1/entries/:date", get(entry_get).delete(entry_delete))
        .route("/api/v1/moods", get(moods_list).post(mood_create))
        .route("/api/v1/moods/:id", put(mood_update))
        .route("/api/v1/profile", get(profile_get).put(profile_put))
        .route("/api/v1/prompts", get(prompts))
        .route("/api/v1/calendar/:year/:month", get(calendar))
        .route("/api/v1/report", get(report))
        .route("/api/v1/reports", get(report_list))
        .route("/api/v1/reports/:key", get(report_stored))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct EntriesQuery {
    from: Option<String>,
    to: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ReportQuery {
    period: Option<String>,
    date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ReportsQuery {
    limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct MoodCreatePayload {
    word: String,
    color: String,
}

#[derive(Debug, Deserialize)]
struct MoodUpdatePayload {
    word: Option<String>,
    color: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusPayload {
    entry_count: i64,
    latest_entry_date: Option<String>,
    streak: u32,
    latest_report: Option<String>,
    report_time: String,
    api_port: u16,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EntriesPayload {
    count: usize,
    entries: Vec<JournalEntry>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MoodView {
    id: String,
    word: String,
    base_color: String,
    shades: Vec<&'static str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CalendarPayload<'a> {
    year: i32,
    month: u32,
    leading_blanks: u32,
    days: Vec<DayView<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DayView<'a> {
    #[serde(flatten)]
    summary: &'a DaySummary,
    gradient: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReportsPayload {
    reports: Vec<ReportMetaRow>,
}

async fn status(State(state): State<ApiState>) -> ApiResult<Json<StatusPayload>> {
    let store = open_store(&state.config)?;
    let database = store.repository();
    let today = Local::now().date_naive();

    let payload = StatusPayload {
        entry_count: database.entry_count()?,
        latest_entry_date: database.latest_entry_date()?,
        streak: compute_streak(store.entries(), today, state.config.streak_policy()),
        latest_report: database.latest_report_meta()?.map(|meta| meta.report_key),
        report_time: state.config.report_time.clone(),
        api_port: state.config.api_port,
    };

    Ok(Json(payload))
}

async fn entries_list(
    State(state): State<ApiState>,
    Query(query): Query<EntriesQuery>,
) -> ApiResult<Json<EntriesPayload>> {
    let from = query.from.as_deref().map(parse_date).transpose()?;
    let to = query.to.as_deref().map(parse_date).transpose()?;

    let store = open_store(&state.config)?;
    let mut entries = store
        .entries()
        .iter()
        .filter(|entry| match entry.day() {
            Some(day) => from.is_none_or(|from| day >= from) && to.is_none_or(|to| day <= to),
            None => from.is_none() && to.is_none(),
        })
        .cloned()
        .collect::<Vec<_>>();
    entries.sort_by(|left, right| left.date.cmp(&right.date));

    Ok(Json(EntriesPayload {
        count: entries.len(),
        entries,
    }))
}

async fn entry_get(
    State(state): State<ApiState>,
    Path(date): Path<String>,
) -> ApiResult<Json<JournalEntry>> {
    let day = parse_date(&date)?;
    let store = open_store(&state.config)?;

    store
        .entry(&day.format("%Y-%m-%d").to_string())
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("No entry for date: {day}")))
}

async fn entry_put(
    State(state): State<ApiState>,
    Json(entry): Json<JournalEntry>,
) -> ApiResult<Json<Value>> {
    let Some(day) = entry.day() else {
        return Err(ApiError::BadRequest(format!(
            "Invalid entry date: {}. Example: 2026-02-18",
            entry.date
        )));
    };

    let mut store = open_store(&state.config)?;
    store.save_entry(entry)?;

    Ok(Json(json!({
        "saved": true,
        "date": day.format("%Y-%m-%d").to_string(),
        "message": post_entry_feedback(day),
    })))
}

async fn entry_delete(
    State(state): State<ApiState>,
    Path(date): Path<String>,
) -> ApiResult<Json<Value>> {
    let day = parse_date(&date)?;
    let mut store = open_store(&state.config)?;

    if !store.delete_entry(&day.format("%Y-%m-%d").to_string())? {
        return Err(ApiError::NotFound(format!("No entry for date: {day}")));
    }

    Ok(Json(json!({ "deleted": true })))
}

async fn moods_list(State(state): State<ApiState>) -> ApiResult<Json<Vec<MoodView>>> {
    let store = open_store(&state.config)?;
    let moods = store
        .catalog()
        .words()
        .iter()
        .map(|mood| MoodView {
            id: mood.id.clone(),
            word: mood.word.clone(),
            base_color: mood.base_color.clone(),
            shades: (MIN_INTENSITY..=MAX_INTENSITY)
                .map(|intensity| shade(&mood.base_color, intensity))
                .collect(),
        })
        .collect();

    Ok(Json(moods))
}

async fn mood_create(
    State(state): State<ApiState>,
    Json(payload): Json<MoodCreatePayload>,
) -> ApiResult<Json<Value>> {
    let mut store = open_store(&state.config)?;
    let mood = store
        .add_mood_word(&payload.word, &payload.color)
        .map_err(|error| ApiError::BadRequest(error.to_string()))?;

    Ok(Json(json!({ "saved": true, "mood": mood })))
}

async fn mood_update(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Json(payload): Json<MoodUpdatePayload>,
) -> ApiResult<Json<Value>> {
    let mut store = open_store(&state.config)?;
    if store.catalog().get(&id).is_none() {
        return Err(ApiError::NotFound(format!("Unknown mood: {id}")));
    }

    let mood = store
        .edit_mood_word(&id, payload.word.as_deref(), payload.color.as_deref())
        .map_err(|error| ApiError::BadRequest(error.to_string()))?;

    Ok(Json(json!({ "saved": true, "mood": mood })))
}

async fn profile_get(State(state): State<ApiState>) -> ApiResult<Json<UserProfile>> {
    let store = open_store(&state.config)?;
    Ok(Json(store.profile()?.redacted()))
}

async fn profile_put(
    State(state): State<ApiState>,
    Json(profile): Json<UserProfile>,
) -> ApiResult<Json<Value>> {
    let mut store = open_store(&state.config)?;
    let profile = keep_masked_pin(profile, &store.profile()?);
    profile
        .validate()
        .map_err(|error| ApiError::BadRequest(error.to_string()))?;
    store.replace_profile(&profile)?;

    Ok(Json(json!({ "saved": true })))
}

// A profile read from GET carries the masked PIN; writing it back keeps the stored one.
fn keep_masked_pin(mut profile: UserProfile, stored: &UserProfile) -> UserProfile {
    if profile.pin() == Some(PIN_MASK) {
        match stored.get(PIN_FIELD) {
            Some(pin) => {
                profile.0.insert(PIN_FIELD.to_string(), pin.clone());
            }
            None => {
                profile.0.remove(PIN_FIELD);
            }
        }
    }
    profile
}

async fn prompts() -> Json<Value> {
    Json(json!({ "prompts": PROMPTS }))
}

async fn calendar(
    State(state): State<ApiState>,
    Path((year, month)): Path<(i32, u32)>,
) -> ApiResult<Json<Value>> {
    let month = calendar_month(month)?;
    let calendar = month_calendar(&state.config, year, month, Local::now().date_naive())?;

    let payload = CalendarPayload {
        year: calendar.year,
        month: calendar.month + 1,
        leading_blanks: calendar.leading_blanks,
        days: calendar
            .cells
            .iter()
            .flatten()
            .map(|summary| DayView {
                summary,
                gradient: summary.css_gradient(),
            })
            .collect(),
    };

    Ok(Json(serde_json::to_value(payload).map_err(anyhow::Error::from)?))
}

async fn report(
    State(state): State<ApiState>,
    Query(query): Query<ReportQuery>,
) -> ApiResult<Json<Report>> {
    let today = Local::now().date_naive();
    let date = query.date.as_deref().map(parse_date).transpose()?;
    let period = ReportPeriod::parse(query.period.as_deref().unwrap_or("weekly"), date, today)
        .map_err(|error| ApiError::BadRequest(error.to_string()))?;

    Ok(Json(period_report(&state.config, period, today)?))
}

async fn report_list(
    State(state): State<ApiState>,
    Query(query): Query<ReportsQuery>,
) -> ApiResult<Json<ReportsPayload>> {
    let limit = query.limit.unwrap_or(10).clamp(1, 100);
    let store = open_store(&state.config)?;

    Ok(Json(ReportsPayload {
        reports: store.repository().list_reports(limit)?,
    }))
}

async fn report_stored(
    State(state): State<ApiState>,
    Path(key): Path<String>,
) -> ApiResult<Json<Value>> {
    let store = open_store(&state.config)?;
    let meta = store
        .repository()
        .report_meta(&key)?
        .ok_or_else(|| ApiError::NotFound(format!("No report stored for: {key}")))?;

    let content = fs::read_to_string(&meta.json_path)
        .with_context(|| format!("Failed to read report JSON file: {}", meta.json_path))?;
    let report: Value = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse report JSON file: {}", meta.json_path))?;

    Ok(Json(report))
}

fn parse_date(input: &str) -> ApiResult<NaiveDate> {
    NaiveDate::parse_from_str(input, "%Y-%m-%d").map_err(|_| {
        ApiError::BadRequest(format!("Invalid date format: {input}. Example: 2026-02-18"))
    })
}

/// One-based month from the URL to the zero-based month the calendar uses.
fn calendar_month(month: u32) -> ApiResult<u32> {
    if (1..=12).contains(&month) {
        Ok(month - 1)
    } else {
        Err(ApiError::BadRequest(format!(
            "Month must be between 1 and 12: {month}"
        )))
    }
}

type ApiResult<T> = std::result::Result<T, ApiError>;

#[derive(Debug)]
enum ApiError {
    BadRequest(String),
    NotFound(String),
    Internal(anyhow::Error),
}

impl From<anyhow::Error> for ApiError {
    fn from(value: anyhow::Error) -> Self {
        Self::Internal(value)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
            }
            ApiError::NotFound(message) => {
                (StatusCode::NOT_FOUND, Json(json!({ "error": message }))).into_response()
            }
            ApiError::Internal(error) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": error.to_string() })),
            )
                .into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ApiError, DayView, StatusPayload, calendar_month, keep_masked_pin, parse_date};
    use crate::analyzer::calendar::DaySummary;
    use crate::journal::UserProfile;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;

    #[test]
    fn calendar_month_is_one_based_on_the_wire() {
        assert_eq!(calendar_month(1).ok(), Some(0));
        assert_eq!(calendar_month(12).ok(), Some(11));
        assert!(matches!(calendar_month(0), Err(ApiError::BadRequest(_))));
        assert!(matches!(calendar_month(13), Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn bad_dates_map_to_400() {
        let error = parse_date("18/02/2026").expect_err("rejected");
        assert_eq!(error.into_response().status(), StatusCode::BAD_REQUEST);
        assert!(parse_date("2026-02-18").is_ok());
    }

    #[test]
    fn internal_errors_map_to_500() {
        let response = ApiError::from(anyhow::anyhow!("disk full")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn masked_pin_written_back_keeps_the_stored_pin() {
        let stored = UserProfile::default().set_field("pin", "1234").expect("pin set");

        let echoed = keep_masked_pin(stored.redacted().with_value("bio", "hi"), &stored);
        assert_eq!(echoed.pin(), Some("1234"));
        assert!(echoed.validate().is_ok());

        let changed = keep_masked_pin(UserProfile::default().with_value("pin", "9876"), &stored);
        assert_eq!(changed.pin(), Some("9876"));

        let bad = keep_masked_pin(UserProfile::default().with_value("pin", "12"), &stored);
        assert!(bad.validate().is_err());
    }

    #[test]
    fn payloads_use_camel_case_keys() {
        let status = serde_json::to_value(StatusPayload {
            entry_count: 2,
            latest_entry_date: None,
            streak: 1,
            latest_report: None,
            report_time: "21:00".to_string(),
            api_port: 7070,
        })
        .expect("serializes");
        assert!(status.get("entryCount").is_some());
        assert!(status.get("latestEntryDate").is_some());

        let summary = DaySummary {
            day: 3,
            has_entry: false,
            bands: Vec::new(),
            is_today: false,
            is_missed: true,
            is_future: false,
            inferred: false,
        };
        let day = serde_json::to_value(DayView {
            summary: &summary,
            gradient: None,
        })
        .expect("serializes");
        assert_eq!(day["hasEntry"], false);
        assert_eq!(day["isMissed"], true);
        assert!(day.get("has_entry").is_none());
    }
}
