//! HTTP use-case API for the task scheduler.
//!
//! # Responsibility
//! - Translate `/api/*` requests into task lifecycle calls.
//! - Marshal tasks to the JSON shape the web client expects (string ids).
//!
//! # Invariants
//! - Store work runs on the blocking pool while holding the connection lock,
//!   so conflicting writes are serialized.
//! - Handlers never panic; every failure becomes an [`ApiError`] response.

use crate::error::ApiError;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{Local, NaiveDate};
use log::{debug, info};
use rusqlite::Connection;
use scheduler_core::{
    ensure_task_schema, format_task_date, next_date, parse_task_date, RepoResult,
    SqliteTaskRepository, Task, TaskDraft, TaskId, TaskService, TaskServiceResult,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;
use tower_http::services::ServeDir;

type Clock = dyn Fn() -> NaiveDate + Send + Sync;

/// Shared state for axum handlers.
#[derive(Clone)]
pub struct AppState {
    conn: Arc<Mutex<Connection>>,
    web_dir: Arc<PathBuf>,
    today: Arc<Clock>,
}

impl AppState {
    /// Wraps a migrated connection; "today" follows the local calendar.
    ///
    /// # Errors
    /// Returns the schema readiness error when `conn` does not hold a usable
    /// `scheduler` table. The check runs once here, not per request.
    pub fn new(conn: Connection, web_dir: impl Into<PathBuf>) -> RepoResult<Self> {
        Self::with_clock(conn, web_dir, || Local::now().date_naive())
    }

    /// Same as [`AppState::new`] with a caller-provided "today".
    pub fn with_clock(
        conn: Connection,
        web_dir: impl Into<PathBuf>,
        today: impl Fn() -> NaiveDate + Send + Sync + 'static,
    ) -> RepoResult<Self> {
        ensure_task_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            web_dir: Arc::new(web_dir.into()),
            today: Arc::new(today),
        })
    }

    fn today(&self) -> NaiveDate {
        (self.today)()
    }
}

/// Builds the API router; any other path is served from the web directory.
pub fn build_router(state: AppState) -> Router {
    let static_files = ServeDir::new(state.web_dir.as_path());
    Router::new()
        .route("/api/nextdate", get(next_date_api))
        .route("/api/tasks", get(list_tasks_api))
        .route(
            "/api/task",
            post(create_task_api)
                .get(get_task_api)
                .put(update_task_api)
                .delete(delete_task_api),
        )
        .route("/api/task/done", post(mark_task_done_api))
        .fallback_service(static_files)
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Wire models
// ---------------------------------------------------------------------------

/// Task as rendered to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskView {
    pub id: String,
    pub date: String,
    pub title: String,
    pub comment: String,
    pub repeat: String,
}

impl From<Task> for TaskView {
    fn from(task: Task) -> Self {
        Self {
            id: task.id.to_string(),
            date: format_task_date(task.date),
            title: task.title,
            comment: task.comment,
            repeat: task.repeat.to_string(),
        }
    }
}

/// `GET /api/tasks` response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskListResponse {
    pub tasks: Vec<TaskView>,
}

/// `POST /api/task` response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedResponse {
    pub id: TaskId,
}

#[derive(Debug, Deserialize)]
struct IdQuery {
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NextDateQuery {
    now: Option<String>,
    date: Option<String>,
    repeat: Option<String>,
}

/// Accepts ids sent either as JSON strings or numbers.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireId {
    Text(String),
    Number(TaskId),
}

#[derive(Debug, Deserialize)]
struct UpdateTaskRequest {
    id: Option<WireId>,
    #[serde(flatten)]
    fields: TaskDraft,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn next_date_api(Query(query): Query<NextDateQuery>) -> Response {
    let present = |value: Option<String>| value.filter(|value| !value.is_empty());
    let (Some(now), Some(date), Some(repeat)) = (
        present(query.now),
        present(query.date),
        present(query.repeat),
    ) else {
        return plain_text(
            StatusCode::BAD_REQUEST,
            "parameters now, date and repeat are required".to_string(),
        );
    };

    let now = match parse_task_date(&now) {
        Ok(now) => now,
        Err(err) => return plain_text(StatusCode::BAD_REQUEST, format!("now: {err}")),
    };
    match next_date(now, &date, &repeat) {
        Ok(next) => plain_text(StatusCode::OK, next),
        Err(err) => {
            debug!("event=next_date module=http status=error error={err}");
            plain_text(StatusCode::BAD_REQUEST, err.to_string())
        }
    }
}

async fn list_tasks_api(State(state): State<AppState>) -> Result<Json<TaskListResponse>, ApiError> {
    let tasks = with_task_service(&state, |service| service.list_tasks()).await?;
    Ok(Json(TaskListResponse {
        tasks: tasks.into_iter().map(TaskView::from).collect(),
    }))
}

async fn create_task_api(
    State(state): State<AppState>,
    payload: Result<Json<TaskDraft>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    let Json(draft) = payload.map_err(|err| {
        ApiError::bad_request("invalid_payload", format!("invalid request payload: {err}"))
    })?;
    let today = state.today();
    let id = with_task_service(&state, move |service| service.create_task(&draft, today)).await?;
    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

async fn get_task_api(
    State(state): State<AppState>,
    Query(query): Query<IdQuery>,
) -> Result<Json<TaskView>, ApiError> {
    let id = require_id(query.id)?;
    let task = with_task_service(&state, move |service| service.get_task(id)).await?;
    Ok(Json(TaskView::from(task)))
}

async fn update_task_api(
    State(state): State<AppState>,
    payload: Result<Json<UpdateTaskRequest>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let Json(request) = payload.map_err(|err| {
        ApiError::bad_request("invalid_payload", format!("invalid request payload: {err}"))
    })?;
    let id = match request.id {
        Some(WireId::Text(raw)) => require_id(Some(raw))?,
        Some(WireId::Number(id)) => validate_id(id)?,
        None => require_id(None)?,
    };
    let draft = request.fields;
    with_task_service(&state, move |service| service.update_task(id, &draft)).await?;
    Ok(Json(json!({})))
}

async fn mark_task_done_api(
    State(state): State<AppState>,
    Query(query): Query<IdQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let id = require_id(query.id)?;
    let today = state.today();
    with_task_service(&state, move |service| service.complete_task(id, today)).await?;
    Ok(Json(json!({})))
}

async fn delete_task_api(
    State(state): State<AppState>,
    Query(query): Query<IdQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let id = require_id(query.id)?;
    with_task_service(&state, move |service| service.delete_task(id)).await?;
    Ok(Json(json!({})))
}

async fn log_request(request: Request, next: Next) -> Response {
    let started_at = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let response = next.run(request).await;
    info!(
        "event=http_request module=http status={} method={method} path={path} duration_ms={}",
        response.status().as_u16(),
        started_at.elapsed().as_millis()
    );
    response
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Runs `f` against a task service bound to the shared connection.
async fn with_task_service<T, F>(state: &AppState, f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: for<'conn> FnOnce(&TaskService<SqliteTaskRepository<'conn>>) -> TaskServiceResult<T>
        + Send
        + 'static,
{
    let conn = Arc::clone(&state.conn);
    tokio::task::spawn_blocking(move || {
        // The connection holds no Rust-side invariant a panicking request could break.
        let guard = conn.lock().unwrap_or_else(PoisonError::into_inner);
        let repo = SqliteTaskRepository::from_ready(&guard);
        let service = TaskService::new(repo);
        f(&service).map_err(ApiError::from)
    })
    .await
    .map_err(|err| ApiError::internal("blocking_join", err))?
}

fn require_id(raw: Option<String>) -> Result<TaskId, ApiError> {
    let raw = non_empty(raw)
        .ok_or_else(|| ApiError::bad_request("missing_id", "task id is required"))?;
    let id = raw
        .parse::<TaskId>()
        .map_err(|_| ApiError::bad_request("invalid_id", format!("invalid task id: `{raw}`")))?;
    validate_id(id)
}

fn validate_id(id: TaskId) -> Result<TaskId, ApiError> {
    if id <= 0 {
        return Err(ApiError::bad_request(
            "invalid_id",
            format!("invalid task id: `{id}`"),
        ));
    }
    Ok(id)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn plain_text(status: StatusCode, body: String) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        body,
    )
        .into_response()
}
