//! Core domain logic for the task scheduler.
//! This crate is the single source of truth for task lifecycle and recurrence invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod recurrence;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::rule::{RecurRule, MAX_DAILY_INTERVAL};
pub use model::task::{
    format_task_date, parse_task_date, NewTask, Task, TaskDraft, TaskId, TASK_DATE_FORMAT,
};
pub use recurrence::{next_date, next_occurrence, RecurrenceError};
pub use repo::task_repo::{
    ensure_task_schema, RepoError, RepoResult, SqliteTaskRepository, TaskStore,
};
pub use service::task_service::{
    Completion, TaskService, TaskServiceError, TaskServiceResult, TASK_LIST_LIMIT,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
