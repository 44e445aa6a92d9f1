//! HTTP-facing error types.
//!
//! # Responsibility
//! - Map lifecycle errors to status codes and a stable JSON error body.
//! - Describe process-level server failures (bind, serve).
//!
//! # Invariants
//! - Error bodies are `{"error": <message>, "code": <stable code>}`.
//! - Storage details are logged, never returned to clients.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use log::error;
use scheduler_core::{RepoError, TaskServiceError};
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

const STORAGE_FAILURE_MESSAGE: &str = "task storage is unavailable";

/// Error returned by API handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    code: &'a str,
}

impl ApiError {
    /// Malformed request input (query parameters, payload shape).
    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            code,
            message: message.into(),
        }
    }

    /// Failure outside the caller's control. `detail` is logged only.
    pub fn internal(event: &str, detail: impl Display) -> Self {
        error!("event={event} module=http status=error error_code=storage_failure error={detail}");
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            code: "storage_failure",
            message: STORAGE_FAILURE_MESSAGE.to_string(),
        }
    }
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}): {}", self.status, self.code, self.message)
    }
}

impl Error for ApiError {}

impl From<TaskServiceError> for ApiError {
    fn from(value: TaskServiceError) -> Self {
        if value.is_validation() {
            return Self::bad_request(value.code(), value.to_string());
        }
        match &value {
            TaskServiceError::TaskNotFound(_) => Self {
                status: StatusCode::NOT_FOUND,
                code: value.code(),
                message: value.to_string(),
            },
            _ => Self::internal("task_storage", &value),
        }
    }
}

impl From<RepoError> for ApiError {
    fn from(value: RepoError) -> Self {
        Self::from(TaskServiceError::from(value))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: &self.message,
            code: self.code,
        };
        (self.status, Json(body)).into_response()
    }
}

/// Process-level server failures.
#[derive(Debug)]
pub enum ServerError {
    /// Listener could not bind to the configured address.
    Bind {
        addr: String,
        source: std::io::Error,
    },
    /// Database does not hold a usable `scheduler` table.
    Storage(RepoError),
    /// Accept loop terminated with an I/O error.
    Serve(std::io::Error),
}

impl Display for ServerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bind { addr, source } => write!(f, "failed to bind {addr}: {source}"),
            Self::Storage(err) => write!(f, "task storage is not ready: {err}"),
            Self::Serve(err) => write!(f, "server stopped: {err}"),
        }
    }
}

impl Error for ServerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Bind { source, .. } => Some(source),
            Self::Storage(err) => Some(err),
            Self::Serve(err) => Some(err),
        }
    }
}
