use std::{net::SocketAddr, sync::Arc};

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use chrono::NaiveDate;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use crate::error::{RangeViolation, ScheduleError, ScheduleResult};
use crate::persistence::{PersistenceError, ScheduleStore};
use crate::{ItemId, Schedule, ScheduleSummary, WorkItem};

pub type SharedStore = Arc<dyn ScheduleStore + Send + Sync>;

#[derive(Clone)]
pub struct AppState {
    schedule: Arc<RwLock<Schedule>>,
    store: Option<SharedStore>,
}

impl AppState {
    pub fn new(schedule: Schedule) -> Self {
        Self {
            schedule: Arc::new(RwLock::new(schedule)),
            store: None,
        }
    }

    /// Persist every accepted mutation to `store` before it becomes visible.
    pub fn with_store(mut self, store: SharedStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_shared(schedule: Arc<RwLock<Schedule>>) -> Self {
        Self {
            schedule,
            store: None,
        }
    }

    pub fn snapshot(&self) -> Schedule {
        self.schedule.read().clone()
    }

    /// Apply `op` to the current schedule and swap in the result.
    ///
    /// The write lock is held across the rebuild and the store write, so a
    /// failure at either step leaves the shared schedule unchanged.
    fn mutate<F>(&self, op: F) -> Result<Schedule, ApiError>
    where
        F: FnOnce(&Schedule) -> ScheduleResult<Schedule>,
    {
        let mut guard = self.schedule.write();
        let next = op(&*guard)?;
        if let Some(store) = &self.store {
            store.save_schedule(&next)?;
        }
        *guard = next.clone();
        Ok(next)
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

#[derive(Debug)]
enum ApiError {
    NotFound(String),
    Conflict(String),
    Invalid(String),
    Internal(String),
}

impl ApiError {
    fn invalid(message: impl Into<String>) -> Self {
        ApiError::Invalid(message.into())
    }
}

impl From<ScheduleError> for ApiError {
    fn from(value: ScheduleError) -> Self {
        match &value {
            ScheduleError::NotFound(_) => ApiError::NotFound(value.to_string()),
            ScheduleError::InvalidRange(RangeViolation::OverlappingBreaks { .. }) => {
                ApiError::Conflict(value.to_string())
            }
            ScheduleError::InvalidRange(_) | ScheduleError::InvalidId(_) => {
                ApiError::Invalid(value.to_string())
            }
        }
    }
}

impl From<PersistenceError> for ApiError {
    fn from(value: PersistenceError) -> Self {
        warn!(error = %value, "failed to persist schedule");
        ApiError::Internal(value.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, "not_found", message),
            ApiError::Conflict(message) => (StatusCode::CONFLICT, "conflict", message),
            ApiError::Invalid(message) => (StatusCode::BAD_REQUEST, "invalid_request", message),
            ApiError::Internal(message) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
            }
        };
        (status, Json(ErrorBody { error, message })).into_response()
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleView {
    pub base_date: NaiveDate,
    pub summary: ScheduleSummary,
    pub items: Vec<WorkItem>,
}

impl From<&Schedule> for ScheduleView {
    fn from(schedule: &Schedule) -> Self {
        Self {
            base_date: schedule.base_date(),
            summary: schedule.summary(),
            items: schedule.items().to_vec(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemDetail {
    pub item: WorkItem,
    pub parts: Vec<WorkItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BaseDatePayload {
    base_date: NaiveDate,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StudyPayload {
    label: String,
    #[serde(default)]
    note: String,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    duration_days: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BreakPayload {
    label: String,
    #[serde(default)]
    note: String,
    start: NaiveDate,
    end: NaiveDate,
}

#[derive(Debug, Deserialize)]
struct NotePayload {
    note: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/schedule", get(get_schedule))
        .route("/schedule/base_date", put(update_base_date))
        .route("/studies", post(create_study))
        .route("/breaks", post(create_break))
        .route("/items/:id", get(get_item).delete(delete_item))
        .route("/items/:id/note", put(update_note))
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, state: AppState) -> std::io::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "study planner HTTP API listening");
    axum::serve(listener, app).await
}

fn parse_id(raw: &str) -> Result<ItemId, ApiError> {
    raw.parse::<ItemId>()
        .map_err(|err| ApiError::invalid(err.to_string()))
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn get_schedule(State(state): State<AppState>) -> Json<ScheduleView> {
    let schedule = state.snapshot();
    Json(ScheduleView::from(&schedule))
}

async fn update_base_date(
    State(state): State<AppState>,
    Json(payload): Json<BaseDatePayload>,
) -> Result<Json<ScheduleView>, ApiError> {
    let next = state.mutate(|schedule| schedule.with_base_date(payload.base_date))?;
    info!(base_date = %payload.base_date, "moved base date");
    Ok(Json(ScheduleView::from(&next)))
}

async fn get_item(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<ItemDetail>, ApiError> {
    let id = parse_id(&raw_id)?;
    let schedule = state.snapshot();
    let item = schedule
        .find(id)
        .cloned()
        .ok_or(ScheduleError::NotFound(id))?;
    let parts = schedule.parts_of(id).into_iter().cloned().collect();
    Ok(Json(ItemDetail { item, parts }))
}

async fn create_study(
    State(state): State<AppState>,
    Json(payload): Json<StudyPayload>,
) -> Result<(StatusCode, Json<ScheduleView>), ApiError> {
    let StudyPayload {
        label,
        note,
        start,
        end,
        duration_days,
    } = payload;
    let next = match (start, end, duration_days) {
        (Some(start), Some(end), None) => {
            state.mutate(|schedule| schedule.insert_study(label.as_str(), start, end, note))?
        }
        (None, None, Some(days)) => {
            state.mutate(|schedule| schedule.append_study(label.as_str(), days, note))?
        }
        _ => {
            return Err(ApiError::invalid(
                "provide either start and end, or durationDays",
            ));
        }
    };
    info!(label = %label, items = next.len(), "added study");
    Ok((StatusCode::CREATED, Json(ScheduleView::from(&next))))
}

async fn create_break(
    State(state): State<AppState>,
    Json(payload): Json<BreakPayload>,
) -> Result<(StatusCode, Json<ScheduleView>), ApiError> {
    let BreakPayload {
        label,
        note,
        start,
        end,
    } = payload;
    let next =
        state.mutate(|schedule| schedule.insert_break(label.as_str(), start, end, note))?;
    info!(label = %label, %start, %end, "added break");
    Ok((StatusCode::CREATED, Json(ScheduleView::from(&next))))
}

async fn delete_item(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<ScheduleView>, ApiError> {
    let id = parse_id(&raw_id)?;
    let next = state.mutate(|schedule| schedule.delete_item(id))?;
    info!(%id, "deleted item");
    Ok(Json(ScheduleView::from(&next)))
}

async fn update_note(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    Json(payload): Json<NotePayload>,
) -> Result<Json<ItemDetail>, ApiError> {
    let id = parse_id(&raw_id)?;
    let next = state.mutate(|schedule| schedule.set_note(id, payload.note))?;
    let item = next
        .find(id)
        .cloned()
        .ok_or_else(|| ApiError::Internal(format!("item {id} missing after note update")))?;
    let parts = next.parts_of(id).into_iter().cloned().collect();
    Ok(Json(ItemDetail { item, parts }))
}
